mod common;

use std::rc::Rc;

use common::{define, define_with, identity_code, init_logging, module_dict, return_global_code, user_module};
use crossbridge_bytecode::RuntimeVersion;
use crossbridge_marshal::{BridgeConfig, BridgeContext, BridgeError};
use crossbridge_object::source::{CodeFlags, HintForm, MethodKind, ModuleObject};
use crossbridge_object::target::TargetType;
use crossbridge_object::{BuiltinKind, SourceValue, TargetValue};
use pretty_assertions::assert_eq;

// --- Functions ---

#[test]
fn test_function_descriptor_describes_the_code() -> Result<(), BridgeError> {
    init_logging();
    let bridge = BridgeContext::new(BridgeConfig::default());
    let module = user_module(&bridge, "app.util");
    let first = define_with(&module, identity_code("first", &["a", "b"])?, |function| {
        function
            .with_defaults(vec![SourceValue::int(2)])
            .with_annotation("b", SourceValue::builtin_type(BuiltinKind::Int))
    });

    let descriptor = bridge.extract(&first, None)?;
    assert_eq!(descriptor.module, "app.util");
    assert_eq!(descriptor.module_file_path, "app/util.py");
    assert_eq!(descriptor.qualified_name, "first");
    assert_eq!(descriptor.argcount, 2);
    assert_eq!(descriptor.varnames, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(descriptor.method_kind, MethodKind::Virtual);
    assert_eq!(descriptor.runtime_version, RuntimeVersion::default());
    assert!(!descriptor.is_code_body());

    let opnames: Vec<&str> = descriptor.instructions.iter().map(|record| record.opname.as_str()).collect();
    assert_eq!(opnames, vec!["RESUME", "LOAD_FAST", "RETURN_VALUE"]);

    assert_eq!(descriptor.default_positional, TargetValue::tuple(vec![TargetValue::integer(2)]));
    assert_eq!(descriptor.default_keyword.as_dict().map(|d| d.borrow().len()), Some(0));
    assert_eq!(descriptor.type_annotations.get("b").map(|hint| hint.ty().clone()), Some(TargetType::builtin(BuiltinKind::Int)));
    Ok(())
}

#[test]
fn test_globals_handle_holds_the_referenced_names() -> Result<(), BridgeError> {
    let bridge = BridgeContext::new(BridgeConfig::default());
    let module = user_module(&bridge, "app.util");
    module_dict(&module).dict_set("LIMIT", SourceValue::int(5));
    let get = define(&module, return_global_code("get", "LIMIT")?);

    let descriptor = bridge.extract(&get, None)?;
    assert_eq!(descriptor.names, vec!["LIMIT".to_string()]);
    let limit = descriptor.globals.as_namespace().and_then(|globals| globals.get("LIMIT"));
    assert_eq!(limit, Some(TargetValue::integer(5)));
    Ok(())
}

#[test]
fn test_constants_and_closure_share_identity_across_extractions() -> Result<(), BridgeError> {
    let bridge = BridgeContext::new(BridgeConfig::default());
    let module = user_module(&bridge, "app.util");
    let shared = SourceValue::list(vec![SourceValue::int(1)]);
    let cell = SourceValue::cell(Some(shared.clone()));

    let mut code = identity_code("inner", &["x"])?;
    code.consts.push(shared.clone());
    code.freevars = vec!["captured".into()];
    let inner = define_with(&module, code, |function| function.with_closure(vec![cell.clone()]));

    let mut code = identity_code("other", &["x"])?;
    code.consts.push(shared);
    code.freevars = vec!["captured".into()];
    let other = define_with(&module, code, |function| function.with_closure(vec![cell.clone()]));

    let first = bridge.extract(&inner, None)?;
    let second = bridge.extract(&other, None)?;
    assert_eq!(first.freevars, vec!["captured".to_string()]);
    assert_eq!(first.closure.len(), 1);
    assert!(first.closure[0].is(&second.closure[0]));
    assert!(first.constants[1].is(&second.constants[1]));
    Ok(())
}

#[test]
fn test_varargs_and_varkeywords_have_fixed_hints() -> Result<(), BridgeError> {
    let bridge = BridgeContext::new(BridgeConfig::default());
    let module = user_module(&bridge, "app.util");
    let mut code = identity_code("collect", &[])?;
    code.varnames = vec!["args".into(), "kwargs".into()];
    code.flags = CodeFlags::VARARGS | CodeFlags::VARKEYWORDS;
    let collect = define_with(&module, code, |function| {
        function
            .with_annotation("args", SourceValue::builtin_type(BuiltinKind::Int))
            .with_annotation("kwargs", SourceValue::builtin_type(BuiltinKind::Str))
    });

    let descriptor = bridge.extract(&collect, None)?;
    assert!(descriptor.supports_extra_positional);
    assert!(descriptor.supports_extra_keywords);
    let hint = |name: &str| descriptor.type_annotations.get(name).map(|hint| hint.ty().clone());
    assert_eq!(hint("args"), Some(TargetType::builtin(BuiltinKind::Tuple)));
    assert_eq!(hint("kwargs"), Some(TargetType::builtin(BuiltinKind::Dict)));
    Ok(())
}

#[test]
fn test_class_variables_are_not_annotations() -> Result<(), BridgeError> {
    let bridge = BridgeContext::new(BridgeConfig::default());
    let module = user_module(&bridge, "app.util");
    let int = SourceValue::builtin_type(BuiltinKind::Int);
    let hinted = define_with(&module, identity_code("hinted", &["size"])?, |function| {
        function
            .with_annotation("counter", SourceValue::hint(HintForm::ClassVar(int.clone())))
            .with_annotation(
                "size",
                SourceValue::hint(HintForm::Annotated { inner: int.clone(), metadata: vec![SourceValue::str("px")] }),
            )
    });

    let hints = bridge.extract(&hinted, None)?.type_annotations;
    assert!(!hints.contains_key("counter"));
    assert_eq!(hints.get("size").map(|hint| hint.ty().clone()), Some(TargetType::builtin(BuiltinKind::Int)));
    Ok(())
}

// --- Code objects ---

#[test]
fn test_code_objects_get_a_body_descriptor() -> Result<(), BridgeError> {
    let bridge = BridgeContext::new(BridgeConfig::default());
    let code = SourceValue::code(Rc::new(return_global_code("<module>", "print")?));

    let descriptor = bridge.extract(&code, None)?;
    assert!(descriptor.is_code_body());
    assert_eq!(descriptor.module_file_path, "app.py");
    assert!(descriptor.closure.is_empty());
    assert_eq!(descriptor.method_kind, MethodKind::Virtual);
    Ok(())
}

#[test]
fn test_only_functions_and_code_are_extractable() {
    let bridge = BridgeContext::new(BridgeConfig::default());
    assert!(matches!(bridge.extract(&SourceValue::int(1), None), Err(BridgeError::NotExtractable(_))));
}

#[test]
fn test_unsupported_engines_are_refused() -> Result<(), BridgeError> {
    let config = BridgeConfig { runtime_version: RuntimeVersion::new(3, 13, 0), ..BridgeConfig::default() };
    let bridge = BridgeContext::new(config);
    let module = user_module(&bridge, "app.util");
    let get = define(&module, return_global_code("get", "LIMIT")?);

    assert!(matches!(bridge.extract(&get, None), Err(BridgeError::UnsupportedRuntimeVersion { .. })));
    Ok(())
}

// --- File paths ---

#[test]
fn test_module_file_paths() {
    let bridge = BridgeContext::new(BridgeConfig::default());
    bridge.register_module(ModuleObject::new("app.views").with_file("/srv/app/views.py"));

    assert_eq!(bridge.module_file_path(None), "<unknown>");
    assert_eq!(bridge.module_file_path(Some("__main__")), "<stdin>");
    assert_eq!(bridge.module_file_path(Some("app.views")), "/srv/app/views.py");
    assert_eq!(bridge.module_file_path(Some("app.models.order")), "app/models/order.py");
}
