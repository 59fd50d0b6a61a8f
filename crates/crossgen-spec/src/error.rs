//! Error types shared across crossgen crates.

use crossgen_vfs::VfsError;
use thiserror::Error;

/// Result type for manifest and extraction operations.
pub type SpecResult<T> = Result<T, SpecError>;

/// Errors raised while reading manifests or building OpenAPI documents.
#[derive(Debug, Error)]
pub enum SpecError {
    /// A manifest could not be read from the source tree.
    #[error("failed to read file {path:?}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: VfsError,
    },

    /// A manifest is not valid YAML or does not match the expected shape.
    #[error("failed to parse file {path:?}: {source}")]
    ParseFailed {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// A CRD or XRD is missing a field required for extraction.
    #[error("invalid {kind} {name:?}: {message}")]
    InvalidDefinition {
        kind: &'static str,
        name: String,
        message: String,
    },

    /// A document could not be serialized.
    #[error("failed to serialize {what}: {message}")]
    SerializeFailed { what: String, message: String },

    /// Virtual filesystem error.
    #[error(transparent)]
    Vfs(#[from] VfsError),
}

impl SpecError {
    /// Creates a new invalid definition error.
    pub fn invalid_definition(
        kind: &'static str,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidDefinition {
            kind,
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a new serialization error.
    pub fn serialize_failed(what: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::SerializeFailed {
            what: what.into(),
            message: err.to_string(),
        }
    }
}

/// Common trait for errors raised by pipeline components.
///
/// Each component defines its own error enum and implements this trait so
/// that callers can report failures uniformly with a stable code.
///
/// # Example
///
/// ```
/// use crossgen_spec::error::BackendError;
///
/// fn report<E: BackendError>(err: E) -> String {
///     format!("[{}] {}", err.code(), err.message())
/// }
/// ```
pub trait BackendError: std::error::Error {
    /// Stable error code such as `"RUNNER_004"` or `"GO_002"`.
    fn code(&self) -> &'static str;

    /// Human-readable message; defaults to the `Display` output.
    fn message(&self) -> String {
        self.to_string()
    }

    /// Error category such as `"runner"`, `"kcl"`, or `"spec"`.
    fn category(&self) -> &'static str;
}

impl BackendError for SpecError {
    fn code(&self) -> &'static str {
        match self {
            SpecError::ReadFailed { .. } => "SPEC_001",
            SpecError::ParseFailed { .. } => "SPEC_002",
            SpecError::InvalidDefinition { .. } => "SPEC_003",
            SpecError::SerializeFailed { .. } => "SPEC_004",
            SpecError::Vfs(_) => "SPEC_005",
        }
    }

    fn category(&self) -> &'static str {
        "spec"
    }
}

impl BackendError for VfsError {
    fn code(&self) -> &'static str {
        match self {
            VfsError::InvalidPath { .. } => "VFS_001",
            VfsError::NotFound { .. } => "VFS_002",
            VfsError::NotUtf8 { .. } => "VFS_003",
            VfsError::Pattern { .. } => "VFS_004",
            VfsError::SymlinkWithoutBase { .. } => "VFS_005",
            VfsError::Host { .. } => "VFS_006",
            VfsError::Archive(_) => "VFS_007",
        }
    }

    fn category(&self) -> &'static str {
        "vfs"
    }
}
