//! Generation orchestrator.
//!
//! Runs every backend over one shared source tree and registers what they
//! produce. Each backend reads through its own copy-on-write [`Overlay`], so
//! nothing a backend stages is visible to the others or to the base.
//!
//! Go and JSON Schema generation are CPU-bound and run on the blocking pool;
//! KCL and Python wait on containers and run as futures. The four are joined
//! together: the first failure is returned and the remaining futures are
//! dropped, which cancels their containers. Models are only registered once
//! every backend has succeeded.

use std::collections::BTreeMap;
use std::sync::Arc;

use crossgen_backend_go::GoError;
use crossgen_backend_json::JsonError;
use crossgen_backend_kcl::{KclConfig, KclError};
use crossgen_backend_python::{PythonConfig, PythonError};
use crossgen_runner::SchemaRunner;
use crossgen_spec::{BackendError, Language};
use crossgen_vfs::{FileSystem, Overlay, VfsError, VirtualFileTree};
use serde::Serialize;
use thiserror::Error;

use crate::registry::{ModelRegistry, RegistryError};

/// Settings for one generation run.
#[derive(Debug, Clone, Default)]
pub struct GenerateConfig {
    pub kcl: KclConfig,
    pub python: PythonConfig,
    /// Source paths skipped by every backend.
    pub exclude: Vec<String>,
}

/// Errors raised by a generation run.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("go generation failed: {0}")]
    Go(#[from] GoError),

    #[error("json schema generation failed: {0}")]
    Json(#[from] JsonError),

    #[error("kcl generation failed: {0}")]
    Kcl(#[from] KclError),

    #[error("python generation failed: {0}")]
    Python(#[from] PythonError),

    #[error("{language} generation task failed: {source}")]
    Join {
        language: Language,
        #[source]
        source: tokio::task::JoinError,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Vfs(#[from] VfsError),
}

impl BackendError for GenerateError {
    fn code(&self) -> &'static str {
        match self {
            GenerateError::Go(e) => e.code(),
            GenerateError::Json(e) => e.code(),
            GenerateError::Kcl(e) => e.code(),
            GenerateError::Python(e) => e.code(),
            GenerateError::Join { .. } => "GENERATE_001",
            GenerateError::Registry(e) => e.code(),
            GenerateError::Vfs(e) => e.code(),
        }
    }

    fn category(&self) -> &'static str {
        match self {
            GenerateError::Go(e) => e.category(),
            GenerateError::Json(e) => e.category(),
            GenerateError::Kcl(e) => e.category(),
            GenerateError::Python(e) => e.category(),
            GenerateError::Join { .. } => "generate",
            GenerateError::Registry(e) => e.category(),
            GenerateError::Vfs(e) => e.category(),
        }
    }
}

/// What a run registered, keyed by language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerateSummary {
    /// Number of files registered per language. Languages whose backend found
    /// nothing to generate are absent.
    pub files: BTreeMap<Language, usize>,
}

impl GenerateSummary {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Generates models in every language and registers them.
pub async fn generate_models(
    base: Arc<VirtualFileTree>,
    runner: &dyn SchemaRunner,
    registry: &mut dyn ModelRegistry,
    config: &GenerateConfig,
) -> Result<GenerateSummary, GenerateError> {
    let go = {
        let overlay = Overlay::new(Arc::clone(&base));
        let exclude = config.exclude.clone();
        async move {
            tokio::task::spawn_blocking(move || crossgen_backend_go::generate(&overlay, &exclude))
                .await
                .map_err(|source| GenerateError::Join {
                    language: Language::Go,
                    source,
                })?
                .map_err(GenerateError::from)
        }
    };

    let json = {
        let overlay = Overlay::new(Arc::clone(&base));
        let exclude = config.exclude.clone();
        async move {
            tokio::task::spawn_blocking(move || crossgen_backend_json::generate(&overlay, &exclude))
                .await
                .map_err(|source| GenerateError::Join {
                    language: Language::Json,
                    source,
                })?
                .map_err(GenerateError::from)
        }
    };

    let kcl = {
        let overlay = Overlay::new(Arc::clone(&base));
        async move {
            crossgen_backend_kcl::generate(&overlay, &config.exclude, runner, &config.kcl)
                .await
                .map_err(GenerateError::from)
        }
    };

    let python = {
        let overlay = Overlay::new(Arc::clone(&base));
        async move {
            crossgen_backend_python::generate(&overlay, &config.exclude, runner, &config.python)
                .await
                .map_err(GenerateError::from)
        }
    };

    let (kcl, python, go, json) = tokio::try_join!(kcl, python, go, json)?;

    let mut summary = GenerateSummary::default();
    let results = [
        (Language::Kcl, kcl),
        (Language::Python, python),
        (Language::Go, go),
        (Language::Json, json),
    ];
    for (language, models) in results {
        match models {
            Some(models) => {
                registry.add_models(language, &models)?;
                summary.files.insert(language, models.len());
            }
            None => tracing::debug!(%language, "nothing generated"),
        }
    }
    Ok(summary)
}
