use crossbridge_bytecode::{CodecError, RuntimeVersion, VersionWindow};
use crossbridge_object::{BuiltinKind, ObjectId, SourceValue};
use crossbridge_types::{RegistryError, TranslationError};
use miette::Diagnostic;
use thiserror::Error;

/// Errors raised by the bridge itself.
///
/// Exceptions raised inside either runtime are values, not `BridgeError`s;
/// see [`BridgeError::into_source_exception`] for the way back.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum BridgeError {
    #[error("malformed bytecode at byte {offset}: {reason}")]
    #[diagnostic(
        code("BRIDGE-001"),
        help("the code object's wordcode or exception table is corrupt or truncated")
    )]
    MalformedEncoding { offset: usize, reason: String },

    #[error("the running engine ({found}) is not supported; supported versions are {window}")]
    #[diagnostic(
        code("BRIDGE-002"),
        help("run under a supported engine or widen `supported_versions` in the bridge configuration")
    )]
    UnsupportedRuntimeVersion { found: RuntimeVersion, window: VersionWindow },

    #[error("{0}")]
    #[diagnostic(code("BRIDGE-003"), help("the external translator rejected the input; it is not retried"))]
    TranslationFailure(#[from] TranslationError),

    #[error("no source type corresponds to target type {0}")]
    #[diagnostic(code("BRIDGE-004"), help("register a mapping or an adapter for the type"))]
    UnresolvedType(String),

    #[error("unable to convert object of type {0}")]
    #[diagnostic(code("BRIDGE-005"), help("pass a default value to convert unknown objects leniently"))]
    UnconvertibleValue(String),

    #[error("{0} is neither a function nor a code object")]
    #[diagnostic(code("BRIDGE-006"))]
    NotExtractable(String),

    #[error("could not find the source namespace for globals handle {0}")]
    #[diagnostic(code("BRIDGE-007"), help("only handles created by this bridge can be mapped back"))]
    UnknownNamespace(ObjectId),

    #[error("invalid bridge configuration: {0}")]
    #[diagnostic(code("BRIDGE-008"))]
    Config(String),
}

pub type BridgeResult<T> = Result<T, BridgeError>;

impl BridgeError {
    /// The `SystemError` raised in the source runtime when a bridge failure
    /// has to cross into it.
    pub fn into_source_exception(self) -> SourceValue {
        SourceValue::new_exception(BuiltinKind::SystemError, self.to_string())
    }
}

impl From<CodecError> for BridgeError {
    fn from(error: CodecError) -> Self {
        match error {
            CodecError::MalformedEncoding { offset, reason } => BridgeError::MalformedEncoding { offset, reason },
            CodecError::UnknownOpcode { opcode, offset } => {
                BridgeError::MalformedEncoding { offset, reason: format!("unknown opcode {opcode}") }
            }
            CodecError::UnsupportedRuntimeVersion { found, window } => {
                BridgeError::UnsupportedRuntimeVersion { found, window }
            }
            CodecError::Assembly(reason) => BridgeError::MalformedEncoding { offset: 0, reason },
        }
    }
}

impl From<RegistryError> for BridgeError {
    fn from(error: RegistryError) -> Self {
        match error {
            RegistryError::Translation(error) => BridgeError::TranslationFailure(error),
            RegistryError::NotAType(repr) => BridgeError::UnresolvedType(repr),
        }
    }
}
