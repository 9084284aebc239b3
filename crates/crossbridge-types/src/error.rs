use miette::Diagnostic;
use thiserror::Error;

/// Failure reported by an external translator for a class, function or
/// code body. Carried unchanged up to the caller.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
#[error("could not translate {subject}: {message}")]
#[diagnostic(code(crossbridge_types::translation))]
pub struct TranslationError {
    pub subject: String,
    pub message: String,
}

impl TranslationError {
    pub fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        TranslationError { subject: subject.into(), message: message.into() }
    }
}

#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum RegistryError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Translation(#[from] TranslationError),

    #[error("{0} is not a type")]
    #[diagnostic(code(crossbridge_types::not_a_type), help("only classes and generic aliases can be resolved"))]
    NotAType(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
