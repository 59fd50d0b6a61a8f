//! Per-language test renderers.
//!
//! A renderer runs the test program of one directory inside the sandbox; the
//! program is expected to leave a `test.yaml` holding an `items` list behind.

use std::collections::BTreeMap;
use std::path::Path;

use crossgen_runner::{RunnerResult, SandboxRequest, SchemaRunner};
use crossgen_vfs::FileSystem;
use futures_util::future::BoxFuture;

use super::builder::BuildConfig;
use super::identify::TestLanguage;

/// Renders one test directory.
pub trait TestRenderer: Send + Sync {
    fn language(&self) -> TestLanguage;

    /// The sandbox job that renders a directory.
    fn request(&self) -> SandboxRequest;

    /// Runs [`request`](Self::request) over `fs`. `host_path` is the
    /// directory `fs` was loaded from, used to resolve symlinks.
    fn render<'a>(
        &'a self,
        fs: &'a mut dyn FileSystem,
        host_path: Option<&'a Path>,
        runner: &'a dyn SchemaRunner,
    ) -> BoxFuture<'a, RunnerResult<()>> {
        Box::pin(async move {
            let mut request = self.request();
            if let Some(host_path) = host_path {
                request = request.host_base_path(host_path);
            }
            tracing::debug!(language = %self.language(), image = %request.image, "rendering test");
            runner.generate(fs, &request).await
        })
    }
}

/// Renders KCL tests with `kcl run`.
#[derive(Debug, Clone)]
pub struct KclRenderer {
    pub image: String,
}

impl TestRenderer for KclRenderer {
    fn language(&self) -> TestLanguage {
        TestLanguage::Kcl
    }

    fn request(&self) -> SandboxRequest {
        SandboxRequest::new(&self.image, ["kcl", "run", "-o", "test.yaml"])
    }
}

/// Renders Python tests with the image's `extract_objects` module.
#[derive(Debug, Clone)]
pub struct PythonRenderer {
    pub image: String,
}

impl TestRenderer for PythonRenderer {
    fn language(&self) -> TestLanguage {
        TestLanguage::Python
    }

    fn request(&self) -> SandboxRequest {
        SandboxRequest::new(&self.image, ["python", "-m", "extract_objects"])
    }
}

/// Builds a renderer from the build settings.
pub type RendererFactory = fn(&BuildConfig) -> Box<dyn TestRenderer>;

fn kcl_renderer(config: &BuildConfig) -> Box<dyn TestRenderer> {
    Box::new(KclRenderer {
        image: config.kcl_image.clone(),
    })
}

fn python_renderer(config: &BuildConfig) -> Box<dyn TestRenderer> {
    Box::new(PythonRenderer {
        image: config.python_image.clone(),
    })
}

/// Maps each test language to the factory of its renderer.
#[derive(Clone)]
pub struct RendererRegistry {
    factories: BTreeMap<TestLanguage, RendererFactory>,
}

impl RendererRegistry {
    /// Creates a registry with no renderers.
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registers `factory` for `language`, replacing any previous one.
    pub fn register(&mut self, language: TestLanguage, factory: RendererFactory) {
        self.factories.insert(language, factory);
    }

    /// Creates the renderer for `language`.
    pub fn create(
        &self,
        language: TestLanguage,
        config: &BuildConfig,
    ) -> Option<Box<dyn TestRenderer>> {
        self.factories.get(&language).map(|factory| factory(config))
    }

    pub fn languages(&self) -> Vec<TestLanguage> {
        self.factories.keys().copied().collect()
    }
}

impl Default for RendererRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(TestLanguage::Kcl, kcl_renderer);
        registry.register(TestLanguage::Python, python_renderer);
        registry
    }
}

impl std::fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererRegistry")
            .field("languages", &self.languages())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossgen_runner::StubRunner;
    use crossgen_vfs::VirtualFileTree;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn test_default_registry() {
        let registry = RendererRegistry::default();
        assert_eq!(registry.languages(), TestLanguage::ALL.to_vec());

        let config = BuildConfig::default();
        let kcl = registry.create(TestLanguage::Kcl, &config).unwrap();
        assert_eq!(kcl.language(), TestLanguage::Kcl);
        assert_eq!(kcl.request().command, vec!["kcl", "run", "-o", "test.yaml"]);
        assert_eq!(kcl.request().image, config.kcl_image);

        let python = registry.create(TestLanguage::Python, &config).unwrap();
        assert_eq!(python.request().command, vec!["python", "-m", "extract_objects"]);
        assert_eq!(python.request().image, config.python_image);

        assert!(RendererRegistry::empty().create(TestLanguage::Kcl, &config).is_none());
    }

    #[tokio::test]
    async fn test_render_passes_host_path() {
        let runner = StubRunner::noop();
        let renderer = KclRenderer {
            image: "kcl:test".to_string(),
        };
        let mut fs = VirtualFileTree::new();
        renderer
            .render(&mut fs, Some(Path::new("/project/tests/test-a")), &runner)
            .await
            .unwrap();

        let requests = runner.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].base_folder, "");
        assert_eq!(
            requests[0].host_base_path,
            Some(PathBuf::from("/project/tests/test-a"))
        );
    }
}
