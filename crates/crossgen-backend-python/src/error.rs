//! Error types for the Python backend.

use crossgen_runner::RunnerError;
use crossgen_spec::{BackendError, SpecError};
use crossgen_vfs::VfsError;
use thiserror::Error;

/// Result type for Python generation.
pub type PythonResult<T> = Result<T, PythonError>;

/// Errors that can occur while generating Python models.
#[derive(Debug, Error)]
pub enum PythonError {
    /// Reading, deriving, or serializing definitions failed.
    #[error(transparent)]
    Spec(#[from] SpecError),

    /// The model generator container failed.
    #[error("python model generation failed: {0}")]
    Runner(#[from] RunnerError),

    /// A generated file is not valid UTF-8 or could not be moved.
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

impl PythonError {
    /// Creates a new restructure error.
    pub fn restructure(path: impl Into<String>, source: VfsError) -> Self {
        Self::Restructure {
            path: path.into(),
            source,
        }
    }
}

impl BackendError for PythonError {
    fn code(&self) -> &'static str {
        match self {
            PythonError::Spec(_) => "PYTHON_001",
            PythonError::Runner(_) => "PYTHON_002",
            PythonError::Restructure { .. } => "PYTHON_003",
            PythonError::Vfs(_) => "PYTHON_004",
        }
    }

    fn category(&self) -> &'static str {
        "python"
    }
}
