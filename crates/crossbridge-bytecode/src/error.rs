use miette::Diagnostic;
use thiserror::Error;

use crate::version::{RuntimeVersion, VersionWindow};

#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed encoding at byte {offset}: {reason}")]
    #[diagnostic(
        code(crossbridge_bytecode::malformed_encoding),
        help("the exception table is truncated or was not produced by a supported runtime")
    )]
    MalformedEncoding { offset: usize, reason: String },

    #[error("unknown opcode {opcode} at byte offset {offset}")]
    #[diagnostic(code(crossbridge_bytecode::unknown_opcode))]
    UnknownOpcode { opcode: u8, offset: usize },

    #[error("runtime version {found} is not supported (supported: {window})")]
    #[diagnostic(code(crossbridge_bytecode::unsupported_version))]
    UnsupportedRuntimeVersion { found: RuntimeVersion, window: VersionWindow },

    #[error("assembly error: {0}")]
    #[diagnostic(code(crossbridge_bytecode::assembly))]
    Assembly(String),
}

pub type CodecResult<T> = Result<T, CodecError>;
