//! Error types for the KCL backend.

use crossgen_runner::RunnerError;
use crossgen_spec::{BackendError, SpecError};
use crossgen_vfs::VfsError;
use thiserror::Error;

/// Result type for KCL generation.
pub type KclResult<T> = Result<T, KclError>;

/// Errors that can occur while generating KCL schemas.
#[derive(Debug, Error)]
pub enum KclError {
    /// Reading or deriving definitions failed.
    #[error(transparent)]
    Spec(#[from] SpecError),

    /// The importer container failed.
    #[error("kcl import failed: {0}")]
    Runner(#[from] RunnerError),

    /// Restructuring the importer output failed.
    #[error("failed to restructure {path}: {source}")]
    Restructure {
        path: String,
        #[source]
        source: VfsError,
    },

    /// Virtual filesystem error.
    #[error(transparent)]
    Vfs(#[from] VfsError),
}

impl KclError {
    /// Creates a new restructure error.
    pub fn restructure(path: impl Into<String>, source: VfsError) -> Self {
        Self::Restructure {
            path: path.into(),
            source,
        }
    }
}

impl BackendError for KclError {
    fn code(&self) -> &'static str {
        match self {
            KclError::Spec(_) => "KCL_001",
            KclError::Runner(_) => "KCL_002",
            KclError::Restructure { .. } => "KCL_003",
            KclError::Vfs(_) => "KCL_004",
        }
    }

    fn category(&self) -> &'static str {
        "kcl"
    }
}
