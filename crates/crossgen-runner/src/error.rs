//! Error types for the sandboxed runner.

use crossgen_spec::BackendError;
use crossgen_vfs::VfsError;
use thiserror::Error;

/// Result type for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Errors that can occur while running a job in a sandbox container.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Docker executable not found.
    #[error("docker executable not found. Ensure Docker is installed and in PATH, or set DOCKER_PATH environment variable")]
    DockerNotFound,

    /// Failed to spawn a docker command.
    #[error("failed to spawn `docker {command}`: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Pulling the image failed.
    #[error("failed to pull image {image}: {stderr}")]
    PullFailed { image: String, stderr: String },

    /// A docker command exited with non-zero status.
    #[error("`docker {command}` exited with status {exit_code}: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    /// The job inside the container exited with non-zero status.
    #[error("container exited with non-zero status: {exit_code}, logs: {logs}")]
    NonZeroExit { exit_code: i64, logs: String },

    /// The container did not finish in time.
    #[error("container did not finish within {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// `docker wait` printed something that is not an exit code.
    #[error("unexpected output from docker wait: {output:?}")]
    InvalidExitCode { output: String },

    /// Packing or unpacking the tree failed.
    #[error("failed to transfer files: {0}")]
    Transfer(#[from] VfsError),
}

impl RunnerError {
    /// Creates a new command failed error.
    pub fn command_failed(
        command: impl Into<String>,
        exit_code: i32,
        stderr: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            command: command.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Creates a new non-zero exit error.
    pub fn non_zero_exit(exit_code: i64, logs: impl Into<String>) -> Self {
        Self::NonZeroExit {
            exit_code,
            logs: logs.into(),
        }
    }
}

impl BackendError for RunnerError {
    fn code(&self) -> &'static str {
        match self {
            RunnerError::DockerNotFound => "RUNNER_001",
            RunnerError::SpawnFailed { .. } => "RUNNER_002",
            RunnerError::PullFailed { .. } => "RUNNER_003",
            RunnerError::CommandFailed { .. } => "RUNNER_004",
            RunnerError::NonZeroExit { .. } => "RUNNER_005",
            RunnerError::Timeout { .. } => "RUNNER_006",
            RunnerError::InvalidExitCode { .. } => "RUNNER_007",
            RunnerError::Transfer(_) => "RUNNER_008",
        }
    }

    fn category(&self) -> &'static str {
        "runner"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RunnerError::non_zero_exit(2, "kcl: import failed");
        assert_eq!(
            err.to_string(),
            "container exited with non-zero status: 2, logs: kcl: import failed"
        );
        assert_eq!(err.code(), "RUNNER_005");

        let err = RunnerError::command_failed("create", 125, "no such image");
        assert!(err.to_string().contains("125"));
    }
}
