//! CLI command implementations

pub mod doctor;
pub mod generate;
pub mod test_build;
pub mod test_generate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use crossgen_spec::BackendError;
use serde::Serialize;

use crate::config::ConfigFile;

/// Options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Explicit config file.
    pub config: Option<PathBuf>,
    /// Overrides the container job timeout.
    pub timeout_secs: Option<u64>,
    /// Overrides the model cache directory.
    pub cache_dir: Option<PathBuf>,
}

impl GlobalOptions {
    /// Resolves the config file, then applies the command-line overrides.
    pub fn resolve(&self) -> Result<ConfigFile> {
        let mut config = ConfigFile::resolve(self.config.as_deref())?;
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = Some(secs);
        }
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = Some(dir.clone());
        }
        Ok(config)
    }
}

/// A structured error in JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct JsonError {
    pub code: String,
    pub category: String,
    pub message: String,
}

impl JsonError {
    /// Reports any pipeline error with its stable code and category.
    pub fn from_backend<E: BackendError + ?Sized>(err: &E) -> Self {
        Self {
            code: err.code().to_string(),
            category: err.category().to_string(),
            message: err.message(),
        }
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")
}

fn canonical_project(project: &str) -> Result<PathBuf> {
    Path::new(project)
        .canonicalize()
        .with_context(|| format!("Project directory not found: {}", project))
}

/// Prints `value` as pretty JSON on stdout.
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossgen_runner::RunnerError;

    #[test]
    fn test_json_error_from_backend() {
        let err = RunnerError::non_zero_exit(2, "import failed");
        let json = serde_json::to_value(JsonError::from_backend(&err)).unwrap();
        assert_eq!(json["code"], err.code());
        assert_eq!(json["category"], "runner");
        assert!(json["message"].as_str().unwrap().contains("import failed"));
    }
}
