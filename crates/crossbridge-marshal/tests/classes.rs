mod common;

use std::rc::Rc;

use common::{
    identity_code, init_logging, module_dict, recording_bridge, user_class, user_module, RecordingBytecodeTranslator,
    RecordingClassTranslator,
};
use crossbridge_marshal::{Bridge, BridgeConfig, BridgeContext, BridgeError};
use crossbridge_object::source::{ClassBuilder, FunctionObject, MethodKind, NativeFunction};
use crossbridge_object::target::{TargetInstance, TargetType};
use crossbridge_object::{BuiltinKind, SourceValue, TargetValue};
use indexmap::IndexMap;
use pretty_assertions::assert_eq;

// --- Test Helpers ---

fn method(module: &SourceValue, class: &str, name: &str, kind: MethodKind) -> Result<SourceValue, BridgeError> {
    let mut code = identity_code(name, &["self"])?;
    code.qualname = format!("{class}.{name}");
    let function = FunctionObject::new(Rc::new(code), module_dict(module)).with_method_kind(kind);
    Ok(SourceValue::from(function))
}

fn translated_type(bridge: &Bridge, class: &SourceValue) -> Result<TargetType, BridgeError> {
    let converted = bridge.to_target(class)?;
    converted.as_type().cloned().ok_or_else(|| BridgeError::UnresolvedType(class.repr()))
}

fn names<V>(map: &IndexMap<String, V>) -> Vec<String> {
    map.keys().cloned().collect()
}

// --- Descriptors ---

#[test]
fn test_methods_are_sorted_by_kind() -> Result<(), BridgeError> {
    init_logging();
    let (bridge, _, classes) = recording_bridge();
    let module = user_module(&bridge, "app.shapes");
    let shape = user_class("app.shapes", "Shape")
        .attribute("area", method(&module, "Shape", "area", MethodKind::Virtual)?)
        .attribute("unit", method(&module, "Shape", "unit", MethodKind::Static)?)
        .attribute("make", method(&module, "Shape", "make", MethodKind::Class)?)
        .attribute("SIDES", SourceValue::int(4))
        .annotation("color", SourceValue::builtin_type(BuiltinKind::Str))
        .build();

    translated_type(&bridge, &shape)?;
    let descriptor = classes.descriptor("Shape").ok_or_else(|| BridgeError::UnresolvedType("Shape".into()))?;
    assert_eq!(descriptor.module, "app.shapes");
    assert_eq!(descriptor.module_file_path, "app/shapes.py");
    assert_eq!(names(&descriptor.instance_methods), vec!["area".to_string()]);
    assert_eq!(names(&descriptor.static_methods), vec!["unit".to_string()]);
    assert_eq!(names(&descriptor.class_methods), vec!["make".to_string()]);
    assert_eq!(descriptor.instance_methods["area"].qualified_name, "Shape.area");
    assert_eq!(descriptor.static_attributes.get("SIDES"), Some(&TargetValue::integer(4)));
    assert_eq!(
        descriptor.type_annotations.get("color").map(|hint| hint.ty().clone()),
        Some(TargetType::builtin(BuiltinKind::Str))
    );
    assert!(descriptor.binary_type.referent().is(&shape));
    Ok(())
}

#[test]
fn test_instances_of_the_class_itself_are_held_back() -> Result<(), BridgeError> {
    let (bridge, _, classes) = recording_bridge();
    user_module(&bridge, "app.shapes");
    let square = user_class("app.shapes", "Square").attribute("SIDES", SourceValue::int(4)).build();
    let unit = SourceValue::instance(&square);
    if let Some(ty) = square.as_type() {
        ty.set_attribute("UNIT", unit.clone());
    }

    translated_type(&bridge, &square)?;
    let descriptor = classes.descriptor("Square").ok_or_else(|| BridgeError::UnresolvedType("Square".into()))?;
    assert_eq!(names(&descriptor.static_attributes), vec!["SIDES".to_string()]);
    assert_eq!(names(&descriptor.self_instances), vec!["UNIT".to_string()]);
    assert!(descriptor.self_instances["UNIT"].referent().is(&unit));
    Ok(())
}

#[test]
fn test_descriptor_attributes_are_named() -> Result<(), BridgeError> {
    let (bridge, _, classes) = recording_bridge();
    user_module(&bridge, "app.shapes");
    let getter = NativeFunction::new("__get__", |_, _| Ok(SourceValue::none()));
    let property = ClassBuilder::new("cached_property")
        .module("_native_props")
        .attribute("__get__", SourceValue::from(getter))
        .build();
    let circle = user_class("app.shapes", "Circle")
        .attribute("radius", SourceValue::instance(&property))
        .attribute("SCALE", SourceValue::float(1.5))
        .build();

    translated_type(&bridge, &circle)?;
    let descriptor = classes.descriptor("Circle").ok_or_else(|| BridgeError::UnresolvedType("Circle".into()))?;
    let descriptor_names: Vec<&str> = descriptor.descriptor_names.iter().map(String::as_str).collect();
    assert_eq!(descriptor_names, vec!["__class__", "__module__", "radius"]);
    assert!(descriptor.static_attributes.get("radius").is_some_and(|value| value.as_opaque().is_some()));
    Ok(())
}

// --- Hierarchies ---

#[test]
fn test_bases_are_translated_first() -> Result<(), BridgeError> {
    let (bridge, _, classes) = recording_bridge();
    user_module(&bridge, "app.shapes");
    let base = user_class("app.shapes", "Base").build();
    let derived = user_class("app.shapes", "Derived").base(&base).build();

    let derived_type = translated_type(&bridge, &derived)?;
    let order: Vec<String> = classes.descriptors.borrow().iter().map(|d| d.qualified_name.clone()).collect();
    assert_eq!(order, vec!["Base".to_string(), "Derived".to_string()]);

    let descriptor = classes.descriptor("Derived").ok_or_else(|| BridgeError::UnresolvedType("Derived".into()))?;
    assert_eq!(descriptor.superclasses.iter().map(|ty| ty.name().to_string()).collect::<Vec<_>>(), vec!["Base"]);
    assert!(derived_type.is_subtype_of(&translated_type(&bridge, &base)?));
    assert!(bridge.to_source(&TargetValue::type_(derived_type))?.is(&derived));
    Ok(())
}

#[test]
fn test_banned_classes_stay_opaque() -> Result<(), BridgeError> {
    let config = BridgeConfig { banned_modules: vec!["vendor".into()], ..BridgeConfig::default() };
    let bridge = BridgeContext::with_translators(
        config,
        Rc::new(RecordingBytecodeTranslator::default()),
        Rc::new(RecordingClassTranslator::default()),
    );
    user_module(&bridge, "vendor.sdk");
    let client = user_class("vendor.sdk", "Client").build();

    let ty = translated_type(&bridge, &client)?;
    assert!(ty.is_opaque());
    assert_eq!(ty.origin().map(|origin| origin.is(&client)), Some(true));
    Ok(())
}

// --- Instances ---

#[test]
fn test_instances_write_target_changes_back() -> Result<(), BridgeError> {
    let (bridge, _, _) = recording_bridge();
    user_module(&bridge, "app.geo");
    let point = user_class("app.geo", "Point").build();
    let p = SourceValue::instance(&point);
    p.set_attr("x", SourceValue::int(1)).map_err(|raised| BridgeError::Config(raised.to_string()))?;

    let converted = bridge.to_target(&p)?;
    let shell = converted.as_instance().ok_or_else(|| BridgeError::UnconvertibleValue(converted.type_name()))?;
    assert_eq!(shell.ty().name(), "Point");
    assert_eq!(shell.get_attribute("x"), Some(TargetValue::integer(1)));

    shell.set_attribute("x", TargetValue::integer(5));
    let back = bridge.to_source(&converted)?;
    assert!(back.is(&p));
    assert_eq!(p.get_attr("x"), Some(SourceValue::int(5)));
    Ok(())
}

#[test]
fn test_target_created_instances_become_fresh_objects() -> Result<(), BridgeError> {
    let (bridge, _, _) = recording_bridge();
    user_module(&bridge, "app.geo");
    let point = user_class("app.geo", "Point").build();
    let point_type = translated_type(&bridge, &point)?;

    let created = TargetInstance::new(point_type);
    created.set_attribute("y", TargetValue::integer(2));
    let back = bridge.to_source(&TargetValue::instance(created))?;
    assert!(back.is_instance(&point));
    assert_eq!(back.get_attr("y"), Some(SourceValue::int(2)));
    Ok(())
}
