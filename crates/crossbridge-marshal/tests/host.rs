mod common;

use std::rc::Rc;

use common::{init_logging, module_dict, recording_bridge, return_global_code, user_module};
use crossbridge_marshal::{BridgeConfig, BridgeContext, BridgeError};
use crossbridge_object::source::ClassBuilder;
use crossbridge_object::target::{OpaqueRef, SourceHost, TargetCode, TargetKwArgs};
use crossbridge_object::{BuiltinKind, SourceValue, TargetValue};
use pretty_assertions::assert_eq;

// --- Test Helpers ---

fn native_handle() -> (SourceValue, SourceValue) {
    let class = ClassBuilder::new("Handle").module("_native_ext").build();
    let handle = SourceValue::instance(&class);
    (class, handle)
}

fn thrown_type(thrown: &TargetValue) -> Option<String> {
    thrown.as_exception().and_then(|e| e.python_type()).map(|ty| ty.name().to_string())
}

fn fail(thrown: TargetValue) -> BridgeError {
    BridgeError::Config(thrown_type(&thrown).unwrap_or_else(|| thrown.type_name()))
}

// --- Attributes ---

#[test]
fn test_attribute_access_on_opaque_references() -> Result<(), BridgeError> {
    init_logging();
    let bridge = BridgeContext::new(BridgeConfig::default());
    let host: &dyn SourceHost = &*bridge;
    let (_, handle) = native_handle();
    handle.set_attr("size", SourceValue::int(3)).map_err(|raised| BridgeError::Config(raised.to_string()))?;
    let reference = OpaqueRef::new(handle.clone());

    assert_eq!(host.get_attribute(&reference, "size").map_err(fail)?, Some(TargetValue::integer(3)));
    assert_eq!(host.get_attribute(&reference, "colour").map_err(fail)?, None);

    host.set_attribute(&reference, "size", &TargetValue::integer(9)).map_err(fail)?;
    assert_eq!(handle.get_attr("size"), Some(SourceValue::int(9)));
    assert!(host.get_attribute_reference(&reference, "size").is_some_and(|r| r.referent() == &SourceValue::int(9)));

    host.delete_attribute(&reference, "size").map_err(fail)?;
    assert_eq!(handle.get_attr("size"), None);
    let thrown = host.delete_attribute(&reference, "size").err();
    assert_eq!(thrown.as_ref().and_then(thrown_type).as_deref(), Some("AttributeError"));
    Ok(())
}

#[test]
fn test_type_and_dict_of_opaque_references() -> Result<(), BridgeError> {
    let bridge = BridgeContext::new(BridgeConfig::default());
    let host: &dyn SourceHost = &*bridge;
    let (class, handle) = native_handle();
    handle.set_attr("size", SourceValue::int(3)).map_err(|raised| BridgeError::Config(raised.to_string()))?;
    let reference = OpaqueRef::new(handle);

    let ty = host.type_of(&reference).map_err(fail)?;
    assert!(ty.as_type().is_some_and(|ty| ty.is_opaque() && ty.origin().is_some_and(|origin| origin.is(&class))));

    let dict = host.get_dict(&reference).map_err(fail)?;
    assert_eq!(dict.keys().cloned().collect::<Vec<_>>(), vec!["size".to_string()]);
    assert_eq!(dict.get("size"), Some(&TargetValue::integer(3)));
    Ok(())
}

// --- Calls ---

#[test]
fn test_calls_marshal_arguments_and_results() -> Result<(), BridgeError> {
    let bridge = BridgeContext::new(BridgeConfig::default());
    let host: &dyn SourceHost = &*bridge;
    let (class, _) = native_handle();

    let mut kwargs = TargetKwArgs::new();
    kwargs.insert("label".to_string(), TargetValue::string("primary"));
    let created = host.call(&OpaqueRef::new(class.clone()), &[], &kwargs).map_err(fail)?;
    let instance = created.as_opaque().map(|reference| reference.referent().clone());
    assert!(instance.as_ref().is_some_and(|instance| instance.is_instance(&class)));
    assert_eq!(instance.and_then(|instance| instance.get_attr("label")), Some(SourceValue::str("primary")));

    let int = OpaqueRef::new(SourceValue::builtin_type(BuiltinKind::Int));
    let thrown = host.call(&int, &[TargetValue::integer(1)], &TargetKwArgs::new()).err();
    assert_eq!(thrown.as_ref().and_then(thrown_type).as_deref(), Some("TypeError"));
    Ok(())
}

// --- Modules ---

#[test]
fn test_modules_are_imported_through_the_host() -> Result<(), BridgeError> {
    let bridge = BridgeContext::new(BridgeConfig::default());
    let host: &dyn SourceHost = &*bridge;
    let config = user_module(&bridge, "app.config");
    module_dict(&config).dict_set("LIMIT", SourceValue::int(3));

    let imported = host.import_module("app.config").map_err(fail)?;
    let module = imported.as_module().ok_or_else(|| BridgeError::UnconvertibleValue(imported.type_name()))?;
    assert_eq!(module.name(), "app.config");
    assert_eq!(module.get_attribute("LIMIT", host).map_err(fail)?, Some(TargetValue::integer(3)));
    assert_eq!(module.loaded_names(), vec!["LIMIT".to_string()]);

    let missing = host.import_module("app.nowhere").err();
    assert_eq!(missing.as_ref().and_then(thrown_type).as_deref(), Some("ModuleNotFoundError"));
    assert_eq!(
        missing.as_ref().and_then(|thrown| thrown.as_exception()).and_then(|e| e.message()),
        Some("No module named 'app.nowhere'")
    );
    Ok(())
}

// --- Function creation ---

#[test]
fn test_functions_created_at_run_time_are_translated() -> Result<(), BridgeError> {
    let (bridge, translator, _) = recording_bridge();
    let host: &dyn SourceHost = &*bridge;
    let module = user_module(&bridge, "app.gen");
    let dict = module_dict(&module);
    dict.dict_set("LIMIT", SourceValue::int(8));

    let code = SourceValue::code(Rc::new(return_global_code("make", "LIMIT")?));
    let code = TargetValue::code(TargetCode::wrapper(OpaqueRef::new(code)));
    let globals = bridge.bridge_namespace(&dict, &[], None)?;

    let created = host.create_function(&code, &globals, &[], "made").map_err(fail)?;
    assert!(created.as_function().is_some());
    assert_eq!(translator.translated_names(), vec!["make".to_string()]);
    assert_eq!(globals.as_namespace().and_then(|map| map.get("LIMIT")), Some(TargetValue::integer(8)));

    let not_code = host.create_function(&TargetValue::integer(1), &globals, &[], "bad").err();
    assert_eq!(not_code.as_ref().and_then(thrown_type).as_deref(), Some("SystemError"));
    Ok(())
}
