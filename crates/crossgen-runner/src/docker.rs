//! Docker-backed sandbox runner.
//!
//! Each job runs in a fresh container driven through the `docker` CLI: the
//! input tree is streamed in with `docker cp -`, the job is started and
//! waited on, and the working directory is streamed back out as a tar.

use std::path::PathBuf;
use std::process::{Output, Stdio};

use crossgen_vfs::{pack, unpack, FileSystem, UnpackOptions};
use futures_util::future::BoxFuture;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::RunnerConfig;
use crate::error::{RunnerError, RunnerResult};
use crate::{SandboxRequest, SchemaRunner};

/// Runs sandbox jobs in Docker containers.
#[derive(Debug, Clone)]
pub struct DockerRunner {
    config: RunnerConfig,
    docker: PathBuf,
}

impl DockerRunner {
    /// Creates a runner with default configuration.
    pub fn new() -> RunnerResult<Self> {
        Self::with_config(RunnerConfig::default())
    }

    /// Creates a runner with the given configuration.
    pub fn with_config(config: RunnerConfig) -> RunnerResult<Self> {
        let docker = find_docker(&config)?;
        Ok(Self { config, docker })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Returns the server version if the daemon is reachable.
    pub async fn server_version(&self) -> Option<String> {
        let output = self
            .run(&["version", "--format", "{{.Server.Version}}"], None)
            .await
            .ok()?;
        output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Returns true if `image` exists locally.
    pub async fn image_present(&self, image: &str) -> RunnerResult<bool> {
        let output = self.run(&["image", "inspect", image], None).await?;
        Ok(output.status.success())
    }

    /// Removes every container carrying the sandbox label.
    ///
    /// Containers can be left behind when a process is killed mid-job.
    pub async fn reap_orphans(&self) -> RunnerResult<usize> {
        let filter = format!("label={}", self.config.label);
        let output = self.checked(&["ps", "-a", "-q", "--filter", &filter], None).await?;
        let ids: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();
        for id in &ids {
            tracing::info!(container = %id, "removing orphaned sandbox container");
            self.remove_container(id).await?;
        }
        Ok(ids.len())
    }

    async fn run(&self, args: &[&str], stdin: Option<Vec<u8>>) -> RunnerResult<Output> {
        let command = args.first().copied().unwrap_or_default().to_string();
        let mut child = Command::new(&self.docker)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RunnerError::SpawnFailed {
                command: command.clone(),
                source,
            })?;

        if let (Some(bytes), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(&bytes)
                .await
                .map_err(|source| RunnerError::SpawnFailed {
                    command: command.clone(),
                    source,
                })?;
            drop(pipe);
        }

        child
            .wait_with_output()
            .await
            .map_err(|source| RunnerError::SpawnFailed { command, source })
    }

    async fn checked(&self, args: &[&str], stdin: Option<Vec<u8>>) -> RunnerResult<Output> {
        let output = self.run(args, stdin).await?;
        if !output.status.success() {
            return Err(RunnerError::command_failed(
                args.first().copied().unwrap_or_default(),
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr).trim(),
            ));
        }
        Ok(output)
    }

    async fn ensure_image(&self, image: &str) -> RunnerResult<()> {
        if self.image_present(image).await? {
            return Ok(());
        }
        tracing::info!(%image, "pulling image");
        let output = self.run(&["pull", image], None).await?;
        if !output.status.success() {
            return Err(RunnerError::PullFailed {
                image: image.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    async fn create_container(&self, request: &SandboxRequest) -> RunnerResult<String> {
        let mut args: Vec<&str> = vec![
            "create",
            "--label",
            &self.config.label,
            "--workdir",
            &self.config.input_path,
            &request.image,
        ];
        args.extend(request.command.iter().map(String::as_str));
        let output = self.checked(&args, None).await?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn remove_container(&self, id: &str) -> RunnerResult<()> {
        self.checked(&["rm", "--force", "--volumes", id], None).await?;
        Ok(())
    }

    async fn wait_container(&self, id: &str) -> RunnerResult<i64> {
        let wait_args = ["wait", id];
        let wait = self.checked(&wait_args, None);
        let output = match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| RunnerError::Timeout {
                    timeout_secs: limit.as_secs(),
                })??,
            None => wait.await?,
        };
        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        text.parse::<i64>()
            .map_err(|_| RunnerError::InvalidExitCode { output: text })
    }

    async fn run_in_container(
        &self,
        id: &str,
        input: Vec<u8>,
        fs: &mut dyn FileSystem,
    ) -> RunnerResult<()> {
        let target = format!("{}:{}", id, self.config.input_path);
        self.checked(&["cp", "-", &target], Some(input)).await?;
        self.checked(&["start", id], None).await?;

        let exit_code = self.wait_container(id).await?;
        if exit_code != 0 {
            let logs = self.run(&["logs", id], None).await?;
            let mut text = String::from_utf8_lossy(&logs.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&logs.stderr));
            return Err(RunnerError::non_zero_exit(exit_code, text.trim()));
        }

        let source = format!("{}:{}", id, self.config.output_path);
        let archive = self.checked(&["cp", &source, "-"], None).await?;
        let options = UnpackOptions::default()
            .with_strip_prefix(self.config.strip_prefix.clone())
            .with_max_file_size(self.config.max_file_size);
        let files = unpack(archive.stdout.as_slice(), fs, &options)?;
        tracing::debug!(container = %id, files, "copied files out of container");
        Ok(())
    }

    async fn generate_inner(
        &self,
        fs: &mut dyn FileSystem,
        request: &SandboxRequest,
    ) -> RunnerResult<()> {
        self.ensure_image(&request.image).await?;

        let options = self.config.pack_options(request.host_base_path.as_deref());
        let input = pack(fs, &request.base_folder, &options)?;

        let id = self.create_container(request).await?;
        tracing::debug!(container = %id, image = %request.image, "created sandbox container");
        let mut guard = ContainerGuard::new(self.docker.clone(), id.clone());

        let outcome = self.run_in_container(&id, input, fs).await;
        let removed = self.remove_container(&id).await;
        guard.disarm();

        outcome?;
        removed
    }
}

impl SchemaRunner for DockerRunner {
    fn generate<'a>(
        &'a self,
        fs: &'a mut dyn FileSystem,
        request: &'a SandboxRequest,
    ) -> BoxFuture<'a, RunnerResult<()>> {
        Box::pin(self.generate_inner(fs, request))
    }
}

/// Schedules container removal if a job is abandoned before cleanup ran.
struct ContainerGuard {
    docker: PathBuf,
    id: String,
    armed: bool,
}

impl ContainerGuard {
    fn new(docker: PathBuf, id: String) -> Self {
        Self {
            docker,
            id,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for ContainerGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        tracing::warn!(container = %self.id, "job abandoned, removing sandbox container");
        let spawned = std::process::Command::new(&self.docker)
            .args(["rm", "--force", "--volumes", &self.id])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        if let Err(err) = spawned {
            tracing::warn!(
                container = %self.id,
                error = %err,
                "failed to schedule container removal"
            );
        }
    }
}

/// Finds the docker executable.
fn find_docker(config: &RunnerConfig) -> RunnerResult<PathBuf> {
    if let Some(path) = &config.docker_path {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    if let Ok(path) = std::env::var("DOCKER_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
    }

    let names = if cfg!(windows) {
        vec!["docker.exe", "docker"]
    } else {
        vec!["docker"]
    };
    for name in names {
        if let Ok(path) = which::which(name) {
            return Ok(path);
        }
    }

    Err(RunnerError::DockerNotFound)
}
