//! Callbacks the target runtime makes on opaque references.

use std::rc::Rc;

use crossbridge_object::source::{CodeObject, FunctionObject, KwArgs};
use crossbridge_object::target::{GlobalsMap, OpaqueRef, SourceHost, TargetException, TargetKwArgs, TargetType};
use crossbridge_object::{BuiltinKind, SourceKind, SourceValue, TargetKind, TargetValue};
use indexmap::IndexMap;
use log::trace;

use crate::context::BridgeContext;
use crate::error::{BridgeError, BridgeResult};
use crate::exception::error_to_target;
use crate::identity::{CloneMap, IdentityMap};

impl BridgeContext {
    fn code_object(&self, code: &TargetValue) -> BridgeResult<Rc<CodeObject>> {
        let source = match code.kind() {
            TargetKind::Code(code) => code.reference().map(|reference| reference.referent().clone()),
            _ => None,
        };
        let source = match source {
            Some(source) => source,
            None => self.to_source(code)?,
        };
        match source.as_code() {
            Some(code) => Ok(code.clone()),
            None => Err(BridgeError::UnconvertibleValue(format!("expected a code object, got {}", source.type_name()))),
        }
    }

    fn function_globals(&self, globals: &TargetValue) -> BridgeResult<SourceValue> {
        match globals.as_namespace() {
            Some(namespace) => self.find_source_namespace(namespace),
            None => self.to_source(globals),
        }
    }

    fn build_function(
        &self,
        code: &TargetValue,
        globals: &TargetValue,
        closure: &[TargetValue],
        name: &str,
    ) -> BridgeResult<TargetValue> {
        let code = self.code_object(code)?;
        let globals = self.function_globals(globals)?;
        let clones = CloneMap::new();
        let cells = closure
            .iter()
            .map(|cell| self.to_source_with(cell, &clones, None))
            .collect::<BridgeResult<Vec<_>>>()?;

        let function = SourceValue::from(FunctionObject::new(code, globals).with_name(name).with_closure(cells));
        self.translate_function(&function, &TargetType::builtin(BuiltinKind::Function), &[])
    }
}

impl SourceHost for BridgeContext {
    fn type_of(&self, reference: &OpaqueRef) -> Result<TargetValue, TargetValue> {
        self.to_target(&reference.referent().type_of()).map_err(error_to_target)
    }

    fn get_attribute(&self, reference: &OpaqueRef, name: &str) -> Result<Option<TargetValue>, TargetValue> {
        trace!("host read of {} on {}", name, reference.referent().type_name());
        match reference.referent().get_attr(name) {
            Some(value) => self.to_target(&value).map(Some).map_err(error_to_target),
            None => Ok(None),
        }
    }

    fn get_attribute_reference(&self, reference: &OpaqueRef, name: &str) -> Option<OpaqueRef> {
        reference.referent().get_attr(name).map(OpaqueRef::new)
    }

    fn set_attribute(&self, reference: &OpaqueRef, name: &str, value: &TargetValue) -> Result<(), TargetValue> {
        let value = self.to_source(value).map_err(error_to_target)?;
        reference.referent().set_attr(name, value).map_err(|raised| self.exception_to_target(&raised))
    }

    fn delete_attribute(&self, reference: &OpaqueRef, name: &str) -> Result<(), TargetValue> {
        reference.referent().del_attr(name).map_err(|raised| self.exception_to_target(&raised))
    }

    fn get_dict(&self, reference: &OpaqueRef) -> Result<IndexMap<String, TargetValue>, TargetValue> {
        let referent = reference.referent();
        let entries = match referent.kind() {
            SourceKind::Instance(instance) => instance.attributes(),
            SourceKind::Type(ty) => ty.attributes(),
            SourceKind::Module(module) => module.dict().dict_items(),
            _ => referent.dir().into_iter().filter_map(|name| referent.get_attr(&name).map(|v| (name, v))).collect(),
        };
        let identity = IdentityMap::new();
        let mut out = IndexMap::new();
        for (name, value) in entries {
            out.insert(name, self.to_target_with(&value, &identity).map_err(error_to_target)?);
        }
        Ok(out)
    }

    fn call(&self, reference: &OpaqueRef, args: &[TargetValue], kwargs: &TargetKwArgs) -> Result<TargetValue, TargetValue> {
        let clones = CloneMap::new();
        let args = args
            .iter()
            .map(|arg| self.to_source_with(arg, &clones, None))
            .collect::<BridgeResult<Vec<_>>>()
            .map_err(error_to_target)?;
        let mut source_kwargs = KwArgs::new();
        for (name, value) in kwargs {
            source_kwargs.insert(name.clone(), self.to_source_with(value, &clones, None).map_err(error_to_target)?);
        }
        match reference.referent().call(&args, &source_kwargs) {
            Ok(result) => self.to_target(&result).map_err(error_to_target),
            Err(raised) => Err(self.exception_to_target(&raised)),
        }
    }

    fn import_module(&self, name: &str) -> Result<TargetValue, TargetValue> {
        match self.module(name) {
            Some(module) => self.to_target(&module).map_err(error_to_target),
            None => Err(TargetValue::exception(TargetException::builtin(
                BuiltinKind::ModuleNotFoundError,
                &format!("No module named '{name}'"),
            ))),
        }
    }

    fn create_function(
        &self,
        code: &TargetValue,
        globals: &TargetValue,
        closure: &[TargetValue],
        name: &str,
    ) -> Result<TargetValue, TargetValue> {
        self.build_function(code, globals, closure, name).map_err(error_to_target)
    }

    fn load_global(&self, namespace: &GlobalsMap, name: &str) -> Result<Option<TargetValue>, TargetValue> {
        self.fetch_global(namespace, name).map_err(error_to_target)
    }
}
