//! Destinations for generated model sets.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crossgen_spec::{BackendError, Language};
use crossgen_vfs::{FileSystem, VfsError, VirtualFileTree};
use thiserror::Error;

/// Errors raised while registering models.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to register {language} models: {source}")]
    Write {
        language: Language,
        #[source]
        source: VfsError,
    },
}

impl BackendError for RegistryError {
    fn code(&self) -> &'static str {
        match self {
            RegistryError::Write { .. } => "REGISTRY_001",
        }
    }

    fn category(&self) -> &'static str {
        "registry"
    }
}

/// Receives one generated model tree per language.
pub trait ModelRegistry: Send {
    fn add_models(
        &mut self,
        language: Language,
        models: &VirtualFileTree,
    ) -> Result<(), RegistryError>;
}

/// Writes models to `<root>/<language>/...` on disk.
///
/// Files of an earlier registration are overwritten; files it no longer
/// produces are left in place.
#[derive(Debug, Clone)]
pub struct CacheRegistry {
    root: PathBuf,
}

impl CacheRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one language's models.
    pub fn language_dir(&self, language: Language) -> PathBuf {
        self.root.join(language.as_str())
    }
}

impl ModelRegistry for CacheRegistry {
    fn add_models(
        &mut self,
        language: Language,
        models: &VirtualFileTree,
    ) -> Result<(), RegistryError> {
        let dir = self.language_dir(language);
        let files = models
            .write_to_dir(&dir)
            .map_err(|source| RegistryError::Write { language, source })?;
        tracing::info!(%language, path = %dir.display(), files, "registered models");
        Ok(())
    }
}

/// Keeps registered models in memory, merging repeated registrations.
#[derive(Debug, Default, Clone)]
pub struct MemoryRegistry {
    models: BTreeMap<Language, VirtualFileTree>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the models registered for `language`.
    pub fn get(&self, language: Language) -> Option<&VirtualFileTree> {
        self.models.get(&language)
    }

    /// Returns every language with registered models, in order.
    pub fn languages(&self) -> Vec<Language> {
        self.models.keys().copied().collect()
    }
}

impl ModelRegistry for MemoryRegistry {
    fn add_models(
        &mut self,
        language: Language,
        models: &VirtualFileTree,
    ) -> Result<(), RegistryError> {
        let target = self.models.entry(language).or_default();
        for (path, entry) in models.iter() {
            target
                .write_entry(path, entry.clone())
                .map_err(|source| RegistryError::Write { language, source })?;
        }
        Ok(())
    }
}
