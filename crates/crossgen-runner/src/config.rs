//! Runner configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crossgen_vfs::{PackOptions, DEFAULT_MAX_FILE_SIZE};

/// Path inside the container the job's files are copied to.
pub const CONTAINER_INPUT_PATH: &str = "/data/input";

/// Label attached to every sandbox container.
pub const SANDBOX_LABEL: &str = "dev.crossgen.sandbox=true";

/// Configuration for [`DockerRunner`](crate::DockerRunner).
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Path to the docker executable; found via `DOCKER_PATH` or `PATH` if unset.
    pub docker_path: Option<PathBuf>,
    /// Directory the input tree is copied into; also the working directory.
    pub input_path: String,
    /// Directory copied back out of the container after the job.
    pub output_path: String,
    /// Prefix stripped from every extracted entry.
    pub strip_prefix: String,
    /// Maximum bytes read per extracted file.
    pub max_file_size: u64,
    /// Label used to find leftover containers.
    pub label: String,
    /// Optional limit on how long the job may run.
    pub timeout: Option<Duration>,
    /// Owner (uid, gid) of the files copied into the container, for images
    /// that run as a non-root user.
    pub owner: Option<(u64, u64)>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            docker_path: None,
            input_path: CONTAINER_INPUT_PATH.to_string(),
            output_path: CONTAINER_INPUT_PATH.to_string(),
            strip_prefix: "input/".to_string(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            label: SANDBOX_LABEL.to_string(),
            timeout: None,
            owner: None,
        }
    }
}

impl RunnerConfig {
    /// Sets the docker executable path.
    pub fn docker_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.docker_path = Some(path.into());
        self
    }

    /// Sets the per-file extraction cap.
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Sets the job timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Some(Duration::from_secs(secs));
        self
    }

    /// Sets the container label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the owner of the files copied into the container.
    pub fn owner(mut self, uid: u64, gid: u64) -> Self {
        self.owner = Some((uid, gid));
        self
    }

    /// Archive settings for a job's input tree.
    pub fn pack_options(&self, host_base_path: Option<&Path>) -> PackOptions {
        let mut options = PackOptions::default();
        if let Some(base) = host_base_path {
            options = options.with_symlink_base(base);
        }
        if let Some((uid, gid)) = self.owner {
            options = options.with_owner(uid, gid);
        }
        options
    }
}
