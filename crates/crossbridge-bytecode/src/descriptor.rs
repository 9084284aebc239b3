use crossbridge_object::source::MethodKind;
use crossbridge_object::target::TypeHint;
use crossbridge_object::TargetValue;
use indexmap::IndexMap;
use serde::Serialize;

use crate::exception_table::ExceptionTableEntry;
use crate::instruction::InstructionRecord;
use crate::version::RuntimeVersion;

/// Everything the bytecode translator needs to compile one function or
/// code body, detached from the live source objects.
///
/// Constants, closure cells, defaults and the globals handle are already
/// bridged into target values.
#[derive(Debug, Clone)]
pub struct CompiledFunctionDescriptor {
    pub module: String,
    pub module_file_path: String,
    pub qualified_name: String,
    pub instructions: Vec<InstructionRecord>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub names: Vec<String>,
    pub varnames: Vec<String>,
    pub cellvars: Vec<String>,
    pub freevars: Vec<String>,
    pub constants: Vec<TargetValue>,
    pub argcount: u32,
    pub posonlyargcount: u32,
    pub kwonlyargcount: u32,
    /// One target cell per free variable.
    pub closure: Vec<TargetValue>,
    /// Namespace handle of the defining module.
    pub globals: TargetValue,
    pub type_annotations: IndexMap<String, TypeHint>,
    /// Tuple of positional defaults.
    pub default_positional: TargetValue,
    /// Dict of keyword-only defaults.
    pub default_keyword: TargetValue,
    pub supports_extra_positional: bool,
    pub supports_extra_keywords: bool,
    pub method_kind: MethodKind,
    pub runtime_version: RuntimeVersion,
}

impl CompiledFunctionDescriptor {
    pub fn is_code_body(&self) -> bool {
        self.module == CODE_BODY_NAME && self.qualified_name == CODE_BODY_NAME
    }

    /// The serializable part of the descriptor.
    pub fn listing(&self) -> CodeListing {
        CodeListing {
            module: self.module.clone(),
            module_file_path: self.module_file_path.clone(),
            qualified_name: self.qualified_name.clone(),
            instructions: self.instructions.clone(),
            exception_table: self.exception_table.clone(),
            names: self.names.clone(),
            varnames: self.varnames.clone(),
            cellvars: self.cellvars.clone(),
            freevars: self.freevars.clone(),
            argcount: self.argcount,
            posonlyargcount: self.posonlyargcount,
            kwonlyargcount: self.kwonlyargcount,
            annotated_parameters: self.type_annotations.keys().cloned().collect(),
            supports_extra_positional: self.supports_extra_positional,
            supports_extra_keywords: self.supports_extra_keywords,
            method_kind: match self.method_kind {
                MethodKind::Virtual => "virtual",
                MethodKind::Static => "static",
                MethodKind::Class => "class",
            },
            runtime_version: self.runtime_version,
        }
    }
}

/// Module and qualified name given to descriptors of bare code objects.
pub const CODE_BODY_NAME: &str = "__code__";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeListing {
    pub module: String,
    pub module_file_path: String,
    pub qualified_name: String,
    pub instructions: Vec<InstructionRecord>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub names: Vec<String>,
    pub varnames: Vec<String>,
    pub cellvars: Vec<String>,
    pub freevars: Vec<String>,
    pub argcount: u32,
    pub posonlyargcount: u32,
    pub kwonlyargcount: u32,
    pub annotated_parameters: Vec<String>,
    pub supports_extra_positional: bool,
    pub supports_extra_keywords: bool,
    pub method_kind: &'static str,
    pub runtime_version: RuntimeVersion,
}
