#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use crossbridge_bytecode::{Assembler, CodecResult, CompiledFunctionDescriptor};
use crossbridge_marshal::{Bridge, BridgeConfig, BridgeContext, BytecodeTranslator, ClassDescriptor, ClassTranslator};
use crossbridge_object::source::{ClassBuilder, CodeObject, FunctionObject, ModuleObject};
use crossbridge_object::target::{TargetCode, TargetFunction, TargetKwArgs, TargetType};
use crossbridge_object::{SourceValue, TargetValue};
use crossbridge_types::TranslationError;
use indexmap::IndexMap;

pub const USER_PACKAGE: &str = "org.jpyinterpreter.user.";

// --- Test Helpers ---

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

type Behavior = Rc<dyn Fn(&[TargetValue], &TargetKwArgs) -> Result<TargetValue, TargetValue>>;

/// Bytecode translator double. Every descriptor it sees is kept; functions
/// run the behavior registered under their qualified name, or return `None`.
#[derive(Default)]
pub struct RecordingBytecodeTranslator {
    pub functions: RefCell<Vec<CompiledFunctionDescriptor>>,
    pub code_bodies: RefCell<Vec<CompiledFunctionDescriptor>>,
    pub behaviors: RefCell<IndexMap<String, Behavior>>,
    pub reject: Option<String>,
}

impl RecordingBytecodeTranslator {
    pub fn rejecting(qualified_name: &str) -> Self {
        RecordingBytecodeTranslator { reject: Some(qualified_name.to_string()), ..Default::default() }
    }

    pub fn behave<F>(&self, qualified_name: &str, behavior: F)
    where
        F: Fn(&[TargetValue], &TargetKwArgs) -> Result<TargetValue, TargetValue> + 'static,
    {
        self.behaviors.borrow_mut().insert(qualified_name.to_string(), Rc::new(behavior));
    }

    pub fn translated_names(&self) -> Vec<String> {
        self.functions.borrow().iter().map(|d| d.qualified_name.clone()).collect()
    }
}

impl BytecodeTranslator for RecordingBytecodeTranslator {
    fn translate_function(
        &self,
        descriptor: CompiledFunctionDescriptor,
        interface: &TargetType,
        _type_args: &[TargetType],
    ) -> Result<TargetValue, TranslationError> {
        let qualified_name = descriptor.qualified_name.clone();
        if self.reject.as_deref() == Some(qualified_name.as_str()) {
            return Err(TranslationError::new(qualified_name, "rejected by test translator"));
        }
        let module = descriptor.module.clone();
        self.functions.borrow_mut().push(descriptor);

        let behavior = self.behaviors.borrow().get(&qualified_name).cloned();
        let callable = move |args: &[TargetValue], kwargs: &TargetKwArgs| match &behavior {
            Some(behavior) => behavior(args, kwargs),
            None => Ok(TargetValue::none()),
        };
        let class_name = format!("{USER_PACKAGE}{module}.{qualified_name}");
        Ok(TargetValue::function(TargetFunction::new(
            qualified_name,
            Some(module),
            class_name,
            interface.clone(),
            callable,
        )))
    }

    fn translate_code(&self, descriptor: CompiledFunctionDescriptor) -> Result<TargetCode, TranslationError> {
        self.code_bodies.borrow_mut().push(descriptor);
        Ok(TargetCode::translated(format!("{USER_PACKAGE}__code__"), None))
    }
}

/// Class translator double that accepts every class.
#[derive(Default)]
pub struct RecordingClassTranslator {
    pub descriptors: RefCell<Vec<ClassDescriptor>>,
}

impl RecordingClassTranslator {
    pub fn descriptor(&self, qualified_name: &str) -> Option<ClassDescriptor> {
        self.descriptors.borrow().iter().find(|d| d.qualified_name == qualified_name).cloned()
    }
}

impl ClassTranslator for RecordingClassTranslator {
    fn prepare_class(&self, class: &SourceValue) -> TargetType {
        let (name, module) = match class.as_type() {
            Some(ty) => (ty.qualname().to_string(), ty.module().unwrap_or("<unknown>").to_string()),
            None => (class.type_name(), "<unknown>".to_string()),
        };
        TargetType::translated(name.clone(), Some(module.clone()), format!("{USER_PACKAGE}{module}.{name}"), Some(class.clone()))
    }

    fn translate_class(&self, descriptor: ClassDescriptor, prepared: &TargetType) -> Result<TargetType, TranslationError> {
        if !descriptor.superclasses.is_empty() {
            prepared.set_supertypes(descriptor.superclasses.clone());
        }
        self.descriptors.borrow_mut().push(descriptor);
        Ok(prepared.clone())
    }
}

/// A bridge with both recording translators installed.
pub fn recording_bridge() -> (Bridge, Rc<RecordingBytecodeTranslator>, Rc<RecordingClassTranslator>) {
    let bytecode = Rc::new(RecordingBytecodeTranslator::default());
    let classes = Rc::new(RecordingClassTranslator::default());
    let bridge = BridgeContext::with_translators(BridgeConfig::default(), bytecode.clone(), classes.clone());
    (bridge, bytecode, classes)
}

pub fn user_module(bridge: &Bridge, name: &str) -> SourceValue {
    bridge.register_module(ModuleObject::new(name))
}

pub fn module_dict(module: &SourceValue) -> SourceValue {
    module.get_attr("__dict__").unwrap_or_else(SourceValue::none)
}

/// Defines a function over `code` in `module` and binds it there.
pub fn define(module: &SourceValue, code: CodeObject) -> SourceValue {
    let name = code.name.clone();
    let function = SourceValue::from(FunctionObject::new(Rc::new(code), module_dict(module)));
    module_dict(module).dict_set(&name, function.clone());
    function
}

pub fn define_with(module: &SourceValue, code: CodeObject, build: impl FnOnce(FunctionObject) -> FunctionObject) -> SourceValue {
    let name = code.name.clone();
    let function = SourceValue::from(build(FunctionObject::new(Rc::new(code), module_dict(module))));
    module_dict(module).dict_set(&name, function.clone());
    function
}

pub fn user_class(module: &str, name: &str) -> ClassBuilder {
    ClassBuilder::new(name).module(module)
}

/// ```text
/// def <name>():
///     return <global>
/// ```
pub fn return_global_code(name: &str, global: &str) -> CodecResult<CodeObject> {
    let mut asm = Assembler::new();
    asm.line(1);
    asm.emit("RESUME", 0)?;
    asm.line(2);
    asm.emit("LOAD_GLOBAL", 0)?;
    asm.emit("RETURN_VALUE", 0)?;

    let mut code = CodeObject {
        name: name.into(),
        qualname: name.into(),
        filename: "app.py".into(),
        first_line: 1,
        consts: vec![SourceValue::none()],
        names: vec![global.into()],
        ..Default::default()
    };
    asm.finish()?.install(&mut code);
    Ok(code)
}

/// ```text
/// def <name>(<params>):
///     return <params[0]>
/// ```
pub fn identity_code(name: &str, params: &[&str]) -> CodecResult<CodeObject> {
    let mut asm = Assembler::new();
    asm.line(1);
    asm.emit("RESUME", 0)?;
    asm.line(2);
    asm.emit("LOAD_FAST", 0)?;
    asm.emit("RETURN_VALUE", 0)?;

    let mut code = CodeObject {
        name: name.into(),
        qualname: name.into(),
        filename: "app.py".into(),
        first_line: 1,
        consts: vec![SourceValue::none()],
        varnames: params.iter().map(|p| p.to_string()).collect(),
        argcount: params.len() as u32,
        ..Default::default()
    };
    asm.finish()?.install(&mut code);
    Ok(code)
}
