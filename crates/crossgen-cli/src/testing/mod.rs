//! Test builder: discovers test directories, renders each one in the
//! sandbox, and decodes the rendered `test.yaml` into typed test cases.
//!
//! - [`discovery`] - matching test directories against glob patterns
//! - [`identify`] - deciding which language a directory is written in
//! - [`render`] - per-language renderers and their registry
//! - [`builder`] - the [`TestBuilder`] tying the steps together

pub mod builder;
pub mod discovery;
pub mod identify;
pub mod render;

pub use builder::{load_e2e, BuildConfig, TestBuilder, E2E_FILE};
pub use discovery::discover_test_directories;
pub use identify::{DefaultIdentifier, Identifier, TestLanguage};
pub use render::{KclRenderer, PythonRenderer, RendererRegistry, TestRenderer};

use crossgen_runner::RunnerError;
use crossgen_spec::{BackendError, DecodeError};
use crossgen_vfs::VfsError;
use thiserror::Error;

/// Result type for test building.
pub type TestResult<T> = Result<T, TestError>;

/// Errors raised while building tests.
#[derive(Debug, Error)]
pub enum TestError {
    /// A discovery pattern could not be evaluated.
    #[error("failed to discover test directories for pattern '{pattern}': {source}")]
    Discovery {
        pattern: String,
        #[source]
        source: VfsError,
    },

    /// Rendering a test directory failed.
    #[error("failed to run test in '{dir}': {source}")]
    Render {
        dir: String,
        #[source]
        source: RunnerError,
    },

    /// Rendering succeeded but left no `test.yaml` behind.
    #[error("failed to read test.yaml in '{dir}'")]
    MissingOutput { dir: String },

    /// The rendered output could not be decoded.
    #[error("failed to decode test.yaml in '{dir}': {source}")]
    Decode {
        dir: String,
        #[source]
        source: DecodeError,
    },

    /// An end-to-end test file could not be read.
    #[error("failed to read e2etest file '{path}': {source}")]
    ReadE2E {
        path: String,
        #[source]
        source: VfsError,
    },

    /// An end-to-end test file is not a valid `E2ETest`.
    #[error("invalid e2etest file '{path}': {source}")]
    ParseE2E {
        path: String,
        #[source]
        source: DecodeError,
    },

    #[error(transparent)]
    Vfs(#[from] VfsError),
}

impl BackendError for TestError {
    fn code(&self) -> &'static str {
        match self {
            TestError::Discovery { .. } => "TEST_001",
            TestError::Render { .. } => "TEST_002",
            TestError::MissingOutput { .. } => "TEST_003",
            TestError::Decode { .. } => "TEST_004",
            TestError::ReadE2E { .. } => "TEST_005",
            TestError::ParseE2E { .. } => "TEST_006",
            TestError::Vfs(_) => "TEST_007",
        }
    }

    fn category(&self) -> &'static str {
        "test"
    }
}
