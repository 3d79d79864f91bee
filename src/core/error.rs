//! Error type shared by the store, import and export layers.

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Discriminant of an [`EngineError`], for callers that branch on the failure
/// without matching on the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Import,
    Export,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Import failed: {0}")]
    Import(String),
    #[error("Export failed: {0}")]
    Export(String),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Validation(_) => ErrorKind::Validation,
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::Import(_) => ErrorKind::Import,
            EngineError::Export(_) => ErrorKind::Export,
        }
    }

    /// The human readable part of the error, without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            EngineError::Validation(m)
            | EngineError::NotFound(m)
            | EngineError::Import(m)
            | EngineError::Export(m) => m,
        }
    }
}

impl From<csv::Error> for EngineError {
    fn from(err: csv::Error) -> Self {
        EngineError::Import(format!("unreadable CSV payload: {err}"))
    }
}

impl From<calamine::XlsxError> for EngineError {
    fn from(err: calamine::XlsxError) -> Self {
        EngineError::Import(format!("unreadable spreadsheet: {err}"))
    }
}

impl From<rust_xlsxwriter::XlsxError> for EngineError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        EngineError::Export(err.to_string())
    }
}
