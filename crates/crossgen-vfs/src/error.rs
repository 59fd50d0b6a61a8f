//! Error types for the virtual filesystem.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for virtual filesystem operations.
pub type VfsResult<T> = Result<T, VfsError>;

/// Errors that can occur while manipulating virtual file trees.
#[derive(Debug, Error)]
pub enum VfsError {
    /// The path escapes the root of the tree or is otherwise unusable.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// No file exists at the given path.
    #[error("file not found: {path}")]
    NotFound { path: String },

    /// File contents are not valid UTF-8.
    #[error("file '{path}' is not valid UTF-8")]
    NotUtf8 { path: String },

    /// A glob pattern failed to compile.
    #[error("invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// A symlink was encountered while packing without a host base path.
    #[error("cannot follow symlink '{path}' unless a host base path is configured")]
    SymlinkWithoutBase { path: String },

    /// Reading from or writing to the host filesystem failed.
    #[error("host filesystem error at {path}: {source}")]
    Host {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Building or reading a tar stream failed.
    #[error("archive error: {0}")]
    Archive(#[source] std::io::Error),
}

impl VfsError {
    /// Creates a new invalid path error.
    pub fn invalid_path(path: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason,
        }
    }

    /// Creates a new not found error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Creates a new host filesystem error.
    pub fn host(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Host {
            path: path.into(),
            source,
        }
    }
}
