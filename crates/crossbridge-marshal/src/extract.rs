//! Turning live functions and code objects into descriptors.

use crossbridge_bytecode::{disassemble, exception_table, identifier, CompiledFunctionDescriptor, CODE_BODY_NAME};
use crossbridge_object::source::{CodeFlags, CodeObject, FunctionObject, HintForm, MethodKind};
use crossbridge_object::target::{TargetType, TypeHint};
use crossbridge_object::{BuiltinKind, SourceKind, SourceValue, TargetValue};
use indexmap::IndexMap;
use log::debug;

use crate::context::BridgeContext;
use crate::error::{BridgeError, BridgeResult};

const UNKNOWN_MODULE: &str = "<unknown>";

impl BridgeContext {
    /// Builds the descriptor of a function or a bare code object.
    ///
    /// `enclosing` is the class a method is being translated for; its own
    /// bindings are not copied into the function's globals. Constants,
    /// closure cells and defaults are bridged through the map shared by all
    /// extractions.
    pub fn extract(&self, value: &SourceValue, enclosing: Option<&SourceValue>) -> BridgeResult<CompiledFunctionDescriptor> {
        self.check_runtime_version()?;
        match value.kind() {
            SourceKind::Function(function) => self.extract_function(function, enclosing),
            SourceKind::Code(code) => self.extract_code(code),
            _ => Err(BridgeError::NotExtractable(value.repr())),
        }
    }

    fn extract_function(
        &self,
        function: &FunctionObject,
        enclosing: Option<&SourceValue>,
    ) -> BridgeResult<CompiledFunctionDescriptor> {
        let code = function.code();
        let instructions = disassemble(code)?;
        let exception_table = exception_table::parse(&code.exception_table)?;
        let constants = self.bridge_all(&code.consts)?;
        let closure = self.bridge_all(function.closure())?;
        let globals = self.bridge_namespace(function.globals(), &code.names, enclosing)?;

        let annotations: Vec<(String, SourceValue)> =
            function.annotations().iter().map(|(name, hint)| (name.clone(), hint.clone())).collect();
        let type_annotations = self.resolve_annotations(
            &annotations,
            &function.default_arguments(),
            code.varargs_name(),
            code.varkeywords_name(),
        )?;

        let default_positional = TargetValue::tuple(self.bridge_all(function.defaults())?);
        let default_keyword = TargetValue::dict([]);
        for (name, value) in function.kwdefaults() {
            default_keyword.dict_insert(TargetValue::string(name.clone()), self.to_target_with(value, &self.shared_identity)?);
        }

        let descriptor = CompiledFunctionDescriptor {
            module: function.module().unwrap_or(UNKNOWN_MODULE).to_string(),
            module_file_path: self.module_file_path(function.module()),
            qualified_name: function.qualname().to_string(),
            instructions,
            exception_table,
            names: code.names.clone(),
            varnames: identifier::sanitize_all(&code.varnames),
            cellvars: identifier::sanitize_all(&code.cellvars),
            freevars: identifier::sanitize_all(&code.freevars),
            constants,
            argcount: code.argcount,
            posonlyargcount: code.posonlyargcount,
            kwonlyargcount: code.kwonlyargcount,
            closure,
            globals,
            type_annotations,
            default_positional,
            default_keyword,
            supports_extra_positional: code.flags.contains(CodeFlags::VARARGS),
            supports_extra_keywords: code.flags.contains(CodeFlags::VARKEYWORDS),
            method_kind: function.method_kind(),
            runtime_version: self.config.runtime_version,
        };
        debug!(
            "extracted {}.{} ({} instructions, {} handlers)",
            descriptor.module,
            descriptor.qualified_name,
            descriptor.instructions.len(),
            descriptor.exception_table.len()
        );
        Ok(descriptor)
    }

    /// Code objects carry no closure, defaults or annotations.
    fn extract_code(&self, code: &CodeObject) -> BridgeResult<CompiledFunctionDescriptor> {
        let descriptor = CompiledFunctionDescriptor {
            module: CODE_BODY_NAME.to_string(),
            module_file_path: code.filename.clone(),
            qualified_name: CODE_BODY_NAME.to_string(),
            instructions: disassemble(code)?,
            exception_table: exception_table::parse(&code.exception_table)?,
            names: code.names.clone(),
            varnames: identifier::sanitize_all(&code.varnames),
            cellvars: identifier::sanitize_all(&code.cellvars),
            freevars: identifier::sanitize_all(&code.freevars),
            constants: self.bridge_all(&code.consts)?,
            argcount: code.argcount,
            posonlyargcount: code.posonlyargcount,
            kwonlyargcount: code.kwonlyargcount,
            closure: Vec::new(),
            globals: TargetValue::dict([]),
            type_annotations: IndexMap::new(),
            default_positional: TargetValue::tuple(Vec::new()),
            default_keyword: TargetValue::dict([]),
            supports_extra_positional: code.flags.contains(CodeFlags::VARARGS),
            supports_extra_keywords: code.flags.contains(CodeFlags::VARKEYWORDS),
            method_kind: MethodKind::Virtual,
            runtime_version: self.config.runtime_version,
        };
        debug!("extracted code body {} ({} instructions)", code.qualname, descriptor.instructions.len());
        Ok(descriptor)
    }

    fn bridge_all(&self, values: &[SourceValue]) -> BridgeResult<Vec<TargetValue>> {
        values.iter().map(|value| self.to_target_with(value, &self.shared_identity)).collect()
    }

    /// Resolves annotations to target hints.
    ///
    /// `*args` and `**kwargs` are always a tuple and a dict, `ClassVar`
    /// members are dropped, `Annotated` is unwrapped, and a parameter with
    /// a default also admits the default's type.
    pub(crate) fn resolve_annotations(
        &self,
        annotations: &[(String, SourceValue)],
        defaults: &IndexMap<String, SourceValue>,
        varargs: Option<&str>,
        varkeywords: Option<&str>,
    ) -> BridgeResult<IndexMap<String, TypeHint>> {
        let mut out = IndexMap::new();
        for (name, hint) in annotations {
            if Some(name.as_str()) == varargs {
                out.insert(name.clone(), TypeHint::of(TargetType::builtin(BuiltinKind::Tuple)));
                continue;
            }
            if Some(name.as_str()) == varkeywords {
                out.insert(name.clone(), TypeHint::of(TargetType::builtin(BuiltinKind::Dict)));
                continue;
            }

            let mut hint = hint.clone();
            loop {
                let inner = match hint.as_hint() {
                    Some(HintForm::Annotated { inner, .. }) => inner.clone(),
                    _ => break,
                };
                hint = inner;
            }
            if matches!(hint.as_hint(), Some(HintForm::ClassVar(_))) {
                continue;
            }
            if let Some(default) = defaults.get(name) {
                hint = SourceValue::hint(HintForm::Union(vec![hint, default.type_of()]));
            }
            out.insert(name.clone(), self.registry.hint(&hint, self)?);
        }
        Ok(out)
    }

    /// The recorded file of `module`, `<stdin>` for the main script, or the
    /// module path with the source extension.
    pub fn module_file_path(&self, module: Option<&str>) -> String {
        let Some(module) = module else {
            return UNKNOWN_MODULE.to_string();
        };
        let recorded = self.module(module).and_then(|value| value.as_module().and_then(|m| m.file().map(str::to_string)));
        if let Some(file) = recorded {
            return file;
        }
        if module == "__main__" {
            return "<stdin>".to_string();
        }
        format!("{}{}", module.replace('.', "/"), self.config.source_file_extension)
    }
}
