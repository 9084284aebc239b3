//! The external translators the bridge hands descriptors to.

use crossbridge_bytecode::CompiledFunctionDescriptor;
use crossbridge_object::target::{TargetCode, TargetType};
use crossbridge_object::{SourceValue, TargetValue};
use crossbridge_types::TranslationError;

use crate::class::ClassDescriptor;

/// Compiles function descriptors into callable target values.
pub trait BytecodeTranslator {
    /// Translates `descriptor` against `interface`, specialized with
    /// `type_args`. The result is expected to be a target function.
    fn translate_function(
        &self,
        descriptor: CompiledFunctionDescriptor,
        interface: &TargetType,
        type_args: &[TargetType],
    ) -> Result<TargetValue, TranslationError>;

    /// Translates a bare code body into a code class.
    fn translate_code(&self, descriptor: CompiledFunctionDescriptor) -> Result<TargetCode, TranslationError>;
}

/// Builds target types from class descriptors.
pub trait ClassTranslator {
    /// A placeholder type for `class`, registered before its bases are
    /// resolved and completed by [`ClassTranslator::translate_class`].
    fn prepare_class(&self, class: &SourceValue) -> TargetType;

    fn translate_class(&self, descriptor: ClassDescriptor, prepared: &TargetType) -> Result<TargetType, TranslationError>;
}

/// Rejects every request. Without a translator every function, code body
/// and user class crosses as an opaque reference.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTranslator;

impl BytecodeTranslator for NoTranslator {
    fn translate_function(
        &self,
        descriptor: CompiledFunctionDescriptor,
        _interface: &TargetType,
        _type_args: &[TargetType],
    ) -> Result<TargetValue, TranslationError> {
        Err(TranslationError::new(descriptor.qualified_name, "no bytecode translator is installed"))
    }

    fn translate_code(&self, descriptor: CompiledFunctionDescriptor) -> Result<TargetCode, TranslationError> {
        Err(TranslationError::new(descriptor.qualified_name, "no bytecode translator is installed"))
    }
}

impl ClassTranslator for NoTranslator {
    fn prepare_class(&self, class: &SourceValue) -> TargetType {
        TargetType::opaque(class)
    }

    fn translate_class(&self, descriptor: ClassDescriptor, _prepared: &TargetType) -> Result<TargetType, TranslationError> {
        Err(TranslationError::new(descriptor.qualified_name, "no class translator is installed"))
    }
}
