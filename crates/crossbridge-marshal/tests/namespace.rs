mod common;

use common::{init_logging, module_dict, user_class, user_module};
use crossbridge_marshal::{BridgeConfig, BridgeContext, BridgeError};
use crossbridge_object::target::GlobalsMap;
use crossbridge_object::{SourceValue, TargetValue};
use pretty_assertions::assert_eq;

// --- Test Helpers ---

fn names(referenced: &[&str]) -> Vec<String> {
    referenced.iter().map(|name| name.to_string()).collect()
}

fn globals(handle: &TargetValue) -> Result<&GlobalsMap, BridgeError> {
    handle.as_namespace().ok_or_else(|| BridgeError::UnconvertibleValue(handle.type_name()))
}

// --- Tests ---

#[test]
fn test_referenced_globals_are_copied_once() -> Result<(), BridgeError> {
    init_logging();
    let bridge = BridgeContext::new(BridgeConfig::default());
    let module = user_module(&bridge, "app.settings");
    let dict = module_dict(&module);
    dict.dict_set("LIMIT", SourceValue::int(10));
    dict.dict_set("UNUSED", SourceValue::str("never copied"));

    let handle = bridge.bridge_namespace(&dict, &names(&["LIMIT", "MISSING"]), None)?;
    let map = globals(&handle)?;
    assert_eq!(map.get("LIMIT"), Some(TargetValue::integer(10)));
    assert_eq!(map.get("__name__"), Some(TargetValue::string("app.settings")));
    assert!(!map.contains("UNUSED"));
    assert!(!map.contains("MISSING"));
    assert_eq!(bridge.namespace_copy_count(&dict), 2);

    let again = bridge.bridge_namespace(&dict, &names(&["LIMIT"]), None)?;
    assert!(again.is(&handle));
    assert_eq!(bridge.namespace_copy_count(&dict), 2);
    Ok(())
}

#[test]
fn test_later_bridges_copy_only_new_names() -> Result<(), BridgeError> {
    let bridge = BridgeContext::new(BridgeConfig::default());
    let module = user_module(&bridge, "app.settings");
    let dict = module_dict(&module);
    dict.dict_set("LIMIT", SourceValue::int(10));

    let handle = bridge.bridge_namespace(&dict, &names(&["LIMIT"]), None)?;
    dict.dict_set("LIMIT", SourceValue::int(20));
    dict.dict_set("NEW", SourceValue::str("fresh"));

    let again = bridge.bridge_namespace(&dict, &names(&["LIMIT", "NEW"]), None)?;
    assert!(again.is(&handle));
    let map = globals(&again)?;
    assert_eq!(map.get("LIMIT"), Some(TargetValue::integer(10)));
    assert_eq!(map.get("NEW"), Some(TargetValue::string("fresh")));
    assert_eq!(bridge.namespace_copy_count(&dict), 3);
    assert_eq!(bridge.copied_names(&dict), names(&["LIMIT", "NEW", "__name__"]));
    Ok(())
}

#[test]
fn test_globals_load_on_demand() -> Result<(), BridgeError> {
    let bridge = BridgeContext::new(BridgeConfig::default());
    let module = user_module(&bridge, "app.settings");
    let dict = module_dict(&module);
    dict.dict_set("LATE", SourceValue::int(99));

    let handle = bridge.bridge_namespace(&dict, &[], None)?;
    let map = globals(&handle)?;
    assert!(!map.contains("LATE"));

    let loaded = map.lookup("LATE", &*bridge).map_err(|_| BridgeError::UnresolvedType("LATE".into()))?;
    assert_eq!(loaded, Some(TargetValue::integer(99)));
    assert!(map.contains("LATE"));
    assert_eq!(bridge.copied_names(&dict), names(&["LATE", "__name__"]));

    assert_eq!(bridge.fetch_global(map, "NOWHERE")?, None);
    Ok(())
}

#[test]
fn test_handles_map_back_to_their_dictionary() -> Result<(), BridgeError> {
    let bridge = BridgeContext::new(BridgeConfig::default());
    let module = user_module(&bridge, "app.settings");
    let dict = module_dict(&module);

    let handle = bridge.bridge_namespace(&dict, &[], None)?;
    assert!(bridge.find_source_namespace(globals(&handle)?)?.is(&dict));
    assert!(bridge.to_source(&handle)?.is(&dict));
    Ok(())
}

#[test]
fn test_foreign_handles() -> Result<(), BridgeError> {
    let bridge = BridgeContext::new(BridgeConfig::default());
    let key = SourceValue::dict([]).id();

    let empty = GlobalsMap::new(key);
    let fresh = bridge.find_source_namespace(&empty)?;
    assert_eq!(fresh.as_dict().map(|d| d.borrow().len()), Some(0));

    let populated = GlobalsMap::new(key);
    populated.insert("x", TargetValue::integer(1));
    assert!(matches!(bridge.find_source_namespace(&populated), Err(BridgeError::UnknownNamespace(_))));
    assert!(matches!(bridge.fetch_global(&populated, "y"), Err(BridgeError::UnknownNamespace(_))));
    Ok(())
}

#[test]
fn test_bindings_of_the_class_under_translation_are_skipped() -> Result<(), BridgeError> {
    let bridge = BridgeContext::new(BridgeConfig::default());
    let module = user_module(&bridge, "app.geometry");
    let dict = module_dict(&module);
    let point = user_class("_native_geometry", "Point").build();
    let point3 = user_class("_native_geometry", "Point3").base(&point).build();
    dict.dict_set("Point", point.clone());
    dict.dict_set("Point3", point3);
    dict.dict_set("ORIGIN", SourceValue::instance(&point));
    dict.dict_set("SCALE", SourceValue::float(1.5));

    bridge.bridge_namespace(&dict, &names(&["Point", "Point3", "ORIGIN", "SCALE"]), Some(&point))?;
    assert_eq!(bridge.copied_names(&dict), names(&["SCALE", "__name__"]));
    Ok(())
}

#[test]
fn test_failed_copies_are_not_marked() {
    let bridge = BridgeContext::new(BridgeConfig::default());
    let module = user_module(&bridge, "app.models");
    let dict = module_dict(&module);
    // Without a class translator a user class cannot cross.
    dict.dict_set("Order", user_class("app.models", "Order").build());

    let outcome = bridge.bridge_namespace(&dict, &names(&["Order"]), None);
    assert!(matches!(outcome, Err(BridgeError::TranslationFailure(_))));
    assert_eq!(bridge.copied_names(&dict), names(&["__name__"]));
    assert_eq!(bridge.namespace_copy_count(&dict), 1);
}

#[test]
fn test_namespace_must_be_a_dict() {
    let bridge = BridgeContext::new(BridgeConfig::default());
    let outcome = bridge.bridge_namespace(&SourceValue::list(vec![]), &[], None);
    assert!(matches!(outcome, Err(BridgeError::UnconvertibleValue(_))));
}
