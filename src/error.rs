//! Error types and handling for the redaction pipeline.

use std::{io, result::Result as StdResult};

use thiserror::Error;

/// Custom result type for redaction operations
pub type Result<T> = StdResult<T, Error>;

/// Core error type for redaction operations.
///
/// Fatal variants (`DocumentParse`, `Save`, `Io`, `Config`) abort the
/// in-flight request. The detection-side variants (`Rule`,
/// `Classification`, `ResponseParse`) are recovered inside their component
/// and never cross the orchestrator boundary; they exist so components can
/// log a typed cause before degrading to a smaller redaction set.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Document parse error: {0}")]
    DocumentParse(String),

    #[error("Rule evaluation error in '{rule}': {message}")]
    Rule { rule: String, message: String },

    #[error("Classification service error: {0}")]
    Classification(String),

    #[error("Classification response parse error: {0}")]
    ResponseParse(String),

    #[error("Save error: {0}")]
    Save(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// True when the error must abort the whole request rather than
    /// degrade to a smaller redaction set.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::DocumentParse(_) | Error::Save(_) | Error::Io(_) | Error::Config(_)
        )
    }
}
