//! Error types for the Go backend.

use crossgen_spec::{BackendError, SpecError};
use crossgen_vfs::VfsError;
use thiserror::Error;

/// Result type for Go generation.
pub type GoResult<T> = Result<T, GoError>;

/// Errors that can occur while generating Go models.
#[derive(Debug, Error)]
pub enum GoError {
    /// Reading or extracting definitions failed.
    #[error(transparent)]
    Spec(#[from] SpecError),

    /// Writing output failed.
    #[error(transparent)]
    Vfs(#[from] VfsError),

    /// A schema could not be turned into Go code.
    #[error("failed to generate Go code for {schema}: {message}")]
    Codegen { schema: String, message: String },
}

impl GoError {
    /// Creates a new codegen error.
    pub fn codegen(schema: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Codegen {
            schema: schema.into(),
            message: message.into(),
        }
    }
}

impl BackendError for GoError {
    fn code(&self) -> &'static str {
        match self {
            GoError::Spec(_) => "GO_001",
            GoError::Vfs(_) => "GO_002",
            GoError::Codegen { .. } => "GO_003",
        }
    }

    fn category(&self) -> &'static str {
        "go"
    }
}
