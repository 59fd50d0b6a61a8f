//! Error types for the JSON Schema backend.

use crossgen_spec::{BackendError, SpecError};
use crossgen_vfs::VfsError;
use thiserror::Error;

/// Result type for JSON Schema generation.
pub type JsonResult<T> = Result<T, JsonError>;

/// Errors that can occur while generating JSON Schemas.
#[derive(Debug, Error)]
pub enum JsonError {
    /// Reading or extracting definitions failed.
    #[error(transparent)]
    Spec(#[from] SpecError),

    /// Writing output failed.
    #[error(transparent)]
    Vfs(#[from] VfsError),

    /// A schema could not be converted.
    #[error("failed to generate jsonschema for {schema}: {source}")]
    Convert {
        schema: String,
        #[source]
        source: serde_json::Error,
    },
}

impl BackendError for JsonError {
    fn code(&self) -> &'static str {
        match self {
            JsonError::Spec(_) => "JSON_001",
            JsonError::Vfs(_) => "JSON_002",
            JsonError::Convert { .. } => "JSON_003",
        }
    }

    fn category(&self) -> &'static str {
        "json"
    }
}
