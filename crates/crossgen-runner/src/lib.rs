//! crossgen sandboxed runner
//!
//! Code generators that are not written in Rust (KCL's importer, Python's
//! model generator, test renderers) run in throwaway containers. A job takes
//! a virtual tree, runs one command over it, and writes whatever the command
//! produced back into the same tree.
//!
//! # Job lifecycle
//!
//! 1. Inspect the image and pull it if it is missing
//! 2. Pack the tree into a tar rooted at the request's base folder
//! 3. Create a labelled container with `/data/input` as working directory
//! 4. Copy the tar into `/data/input`, start the container, and wait
//! 5. On non-zero exit, fail with the exit code and the container logs
//! 6. On success, copy `/data/input` back, stripping `input/`, capping each
//!    file at the configured size
//! 7. Remove the container and its volumes, whatever the outcome
//!
//! A job abandoned mid-flight (its future dropped) schedules removal of its
//! container on drop; [`DockerRunner::reap_orphans`] sweeps anything left.
//!
//! # Docker Requirements
//!
//! The runner drives the `docker` CLI. It is searched for in:
//!
//! 1. [`RunnerConfig::docker_path`]
//! 2. `DOCKER_PATH` environment variable
//! 3. System PATH

use std::path::PathBuf;

use crossgen_vfs::FileSystem;
use futures_util::future::BoxFuture;

pub mod config;
pub mod docker;
pub mod error;
pub mod stub;

pub use config::{RunnerConfig, CONTAINER_INPUT_PATH, SANDBOX_LABEL};
pub use docker::DockerRunner;
pub use error::{RunnerError, RunnerResult};
pub use stub::StubRunner;

/// One sandbox job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxRequest {
    /// Image to run; pulled if absent.
    pub image: String,
    /// Command executed in the container.
    pub command: Vec<String>,
    /// Folder the tree is nested under inside the input directory (`""` for none).
    pub base_folder: String,
    /// Host directory the tree was loaded from, used to resolve symlinks.
    pub host_base_path: Option<PathBuf>,
}

impl SandboxRequest {
    /// Creates a request running `command` in `image`.
    pub fn new<I, S>(image: impl Into<String>, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            image: image.into(),
            command: command.into_iter().map(Into::into).collect(),
            base_folder: String::new(),
            host_base_path: None,
        }
    }

    /// Nests the tree under `folder` inside the container.
    pub fn base_folder(mut self, folder: impl Into<String>) -> Self {
        self.base_folder = folder.into();
        self
    }

    /// Resolves symlinks in the tree against `path`.
    pub fn host_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.host_base_path = Some(path.into());
        self
    }
}

/// Runs a command over a virtual tree in isolation.
///
/// Implementations mutate `fs` in place: on success it holds every file the
/// command left in the working directory.
pub trait SchemaRunner: Send + Sync {
    fn generate<'a>(
        &'a self,
        fs: &'a mut dyn FileSystem,
        request: &'a SandboxRequest,
    ) -> BoxFuture<'a, RunnerResult<()>>;
}
