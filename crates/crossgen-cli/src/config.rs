//! Configuration file and environment overrides.
//!
//! Settings are resolved in this order, later sources winning:
//!
//! 1. Built-in defaults (pinned images, lenient decoding, `.crossgen` cache)
//! 2. The JSON config file (`--config`, or `crossgen/config.json` in the
//!    user's config directory when present)
//! 3. `CROSSGEN_KCL_IMAGE`, `CROSSGEN_PYTHON_IMAGE`,
//!    `CROSSGEN_PYTHON_TEST_IMAGE`
//! 4. Command-line flags, applied by the commands themselves

use std::path::{Path, PathBuf};

use crossgen_backend_kcl::KclConfig;
use crossgen_backend_python::PythonConfig;
use crossgen_runner::RunnerConfig;
use crossgen_spec::DecodeMode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generate::GenerateConfig;
use crate::testing::builder::{BuildConfig, DEFAULT_PYTHON_TEST_IMAGE};

/// Overrides the KCL image used for generation and test rendering.
pub const KCL_IMAGE_ENV: &str = "CROSSGEN_KCL_IMAGE";
/// Overrides the Python model generator image.
pub const PYTHON_IMAGE_ENV: &str = "CROSSGEN_PYTHON_IMAGE";
/// Overrides the Python test renderer image.
pub const PYTHON_TEST_IMAGE_ENV: &str = "CROSSGEN_PYTHON_TEST_IMAGE";

/// Directory models are registered under when no cache directory is set.
pub const DEFAULT_CACHE_DIR: &str = ".crossgen";

/// Errors raised while loading the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Contents of `crossgen.json`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigFile {
    /// Image for KCL generation and KCL test rendering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kcl_image: Option<String>,
    /// Image for Python model generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python_image: Option<String>,
    /// Image for Python test rendering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python_test_image: Option<String>,
    /// Source paths excluded from generation.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
    /// Per-file cap when copying container output back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_file_size: Option<u64>,
    /// Limit on a single container job.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Owner uid of the files copied into sandbox containers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox_uid: Option<u64>,
    /// Owner gid of the files copied into sandbox containers; defaults to
    /// the uid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox_gid: Option<u64>,
    /// Where generated models are registered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    /// How unrecognized rendered test items are handled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decode_mode: Option<DecodeMode>,
}

impl ConfigFile {
    /// Parses a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `path` if given, else the user-level config file if it exists,
    /// else the defaults. Environment overrides are applied on top.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => match user_config_path() {
                Some(path) if path.is_file() => {
                    tracing::debug!(path = %path.display(), "loading user config");
                    Self::load(&path)?
                }
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies image overrides from the environment through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(image) = non_empty(KCL_IMAGE_ENV) {
            self.kcl_image = Some(image);
        }
        if let Some(image) = non_empty(PYTHON_IMAGE_ENV) {
            self.python_image = Some(image);
        }
        if let Some(image) = non_empty(PYTHON_TEST_IMAGE_ENV) {
            self.python_test_image = Some(image);
        }
    }

    /// Builds the generation settings.
    pub fn generate_config(&self) -> GenerateConfig {
        let mut kcl = KclConfig::default();
        if let Some(image) = &self.kcl_image {
            kcl = kcl.image(image);
        }
        let mut python = PythonConfig::default();
        if let Some(image) = &self.python_image {
            python = python.image(image);
        }
        GenerateConfig {
            kcl,
            python,
            exclude: self.exclude.clone(),
        }
    }

    /// Builds the test builder settings.
    pub fn build_config(&self) -> BuildConfig {
        let mut config = BuildConfig::default();
        if let Some(image) = &self.kcl_image {
            config.kcl_image = image.clone();
        }
        config.python_image = self
            .python_test_image
            .clone()
            .unwrap_or_else(|| DEFAULT_PYTHON_TEST_IMAGE.to_string());
        if let Some(mode) = self.decode_mode {
            config.decode_mode = mode;
        }
        config
    }

    /// Builds the sandbox runner settings.
    pub fn runner_config(&self) -> RunnerConfig {
        let mut config = RunnerConfig::default();
        if let Some(bytes) = self.max_file_size {
            config = config.max_file_size(bytes);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.timeout_secs(secs);
        }
        if let Some(uid) = self.sandbox_uid {
            config = config.owner(uid, self.sandbox_gid.unwrap_or(uid));
        }
        config
    }

    /// Returns the model cache directory, relative paths resolved against `project`.
    pub fn cache_root(&self, project: &Path) -> PathBuf {
        match &self.cache_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => project.join(dir),
            None => project.join(DEFAULT_CACHE_DIR),
        }
    }
}

/// Returns the user-level config file location.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("crossgen").join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossgen_backend_kcl::DEFAULT_KCL_IMAGE;
    use crossgen_backend_python::DEFAULT_PYTHON_IMAGE;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let config = ConfigFile::default();
        let generate = config.generate_config();
        assert_eq!(generate.kcl.image, DEFAULT_KCL_IMAGE);
        assert_eq!(generate.python.image, DEFAULT_PYTHON_IMAGE);
        assert!(generate.exclude.is_empty());

        let build = config.build_config();
        assert_eq!(build.kcl_image, DEFAULT_KCL_IMAGE);
        assert_eq!(build.python_image, DEFAULT_PYTHON_TEST_IMAGE);
        assert_eq!(build.decode_mode, DecodeMode::Lenient);

        assert_eq!(config.cache_root(Path::new("/p")), PathBuf::from("/p/.crossgen"));
    }

    #[test]
    fn test_load_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crossgen.json");
        std::fs::write(
            &path,
            r#"{"kclImage": "kcl:dev", "exclude": ["apis/old"], "timeoutSecs": 90, "decodeMode": "strict", "cacheDir": "/var/cache/models"}"#,
        )
        .unwrap();

        let config = ConfigFile::load(&path).unwrap();
        assert_eq!(config.kcl_image.as_deref(), Some("kcl:dev"));
        assert_eq!(config.exclude, vec!["apis/old"]);
        assert_eq!(config.build_config().decode_mode, DecodeMode::Strict);
        assert_eq!(config.runner_config().timeout, Some(Duration::from_secs(90)));
        assert_eq!(
            config.cache_root(Path::new("/p")),
            PathBuf::from("/var/cache/models")
        );
    }

    #[test]
    fn test_sandbox_owner() {
        let config: ConfigFile = serde_json::from_str(r#"{"sandboxUid": 1000}"#).unwrap();
        assert_eq!(config.runner_config().owner, Some((1000, 1000)));

        let config: ConfigFile =
            serde_json::from_str(r#"{"sandboxUid": 1000, "sandboxGid": 2000}"#).unwrap();
        assert_eq!(config.runner_config().owner, Some((1000, 2000)));

        assert_eq!(ConfigFile::default().runner_config().owner, None);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(ConfigFile::load(&missing), Err(ConfigError::Read { .. })));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ nope").unwrap();
        assert!(matches!(ConfigFile::load(&broken), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = ConfigFile {
            kcl_image: Some("kcl:file".to_string()),
            python_image: Some("py:file".to_string()),
            ..Default::default()
        };
        let env: HashMap<&str, &str> = [
            (KCL_IMAGE_ENV, "kcl:env"),
            (PYTHON_IMAGE_ENV, ""),
            (PYTHON_TEST_IMAGE_ENV, "pytest:env"),
        ]
        .into_iter()
        .collect();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.kcl_image.as_deref(), Some("kcl:env"));
        assert_eq!(config.python_image.as_deref(), Some("py:file"));
        assert_eq!(config.build_config().python_image, "pytest:env");
        assert_eq!(config.generate_config().kcl.image, "kcl:env");
    }
}
