//! The test builder.

use std::path::Path;
use std::sync::Arc;

use crossgen_backend_kcl::DEFAULT_KCL_IMAGE;
use crossgen_runner::SchemaRunner;
use crossgen_spec::{decode_items, parse_e2e, DecodeMode, E2ETest, TestCase};
use crossgen_vfs::{path, FileSystem, Overlay, VirtualFileTree};

use super::discovery::discover_test_directories;
use super::identify::{DefaultIdentifier, Identifier};
use super::render::RendererRegistry;
use super::{TestError, TestResult};

/// Image rendering Python tests.
pub const DEFAULT_PYTHON_TEST_IMAGE: &str = "docker.io/haarchri/python-test:0.9";

/// File each test program writes its manifests to.
pub const RENDERED_FILE: &str = "test.yaml";

/// Plain end-to-end test file, used as is when a directory has no program.
pub const E2E_FILE: &str = "e2etest.yaml";

/// Settings for the test builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Image rendering KCL tests.
    pub kcl_image: String,
    /// Image rendering Python tests.
    pub python_image: String,
    /// Handling of rendered items that are not test cases.
    pub decode_mode: DecodeMode,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            kcl_image: DEFAULT_KCL_IMAGE.to_string(),
            python_image: DEFAULT_PYTHON_TEST_IMAGE.to_string(),
            decode_mode: DecodeMode::default(),
        }
    }
}

/// Renders test directories and decodes their output.
///
/// ```no_run
/// # async fn example(runner: &dyn crossgen_runner::SchemaRunner) -> anyhow::Result<()> {
/// use crossgen_cli::testing::{BuildConfig, TestBuilder};
/// use crossgen_vfs::VirtualFileTree;
///
/// let tests = VirtualFileTree::load_dir("tests".as_ref())?;
/// let builder = TestBuilder::new(runner, BuildConfig::default());
/// let cases = builder
///     .build(&tests, &["tests/*".to_string()], "tests/", "test-", Some("tests".as_ref()))
///     .await?;
/// println!("{} test cases", cases.len());
/// # Ok(())
/// # }
/// ```
pub struct TestBuilder<'a> {
    runner: &'a dyn SchemaRunner,
    identifier: Box<dyn Identifier>,
    renderers: RendererRegistry,
    config: BuildConfig,
}

impl<'a> TestBuilder<'a> {
    /// Creates a builder with the default identifier and renderers.
    pub fn new(runner: &'a dyn SchemaRunner, config: BuildConfig) -> Self {
        Self {
            runner,
            identifier: Box::new(DefaultIdentifier),
            renderers: RendererRegistry::default(),
            config,
        }
    }

    /// Replaces the language identifier.
    pub fn identifier(mut self, identifier: impl Identifier + 'static) -> Self {
        self.identifier = Box::new(identifier);
        self
    }

    /// Replaces the renderer registry.
    pub fn renderers(mut self, renderers: RendererRegistry) -> Self {
        self.renderers = renderers;
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Builds every test directory `patterns` select.
    ///
    /// `tests` is the tests folder loaded into memory and `host_root` the host
    /// directory it came from, if any. A directory with no recognizable
    /// language is read from its [`E2E_FILE`] when it has one and skipped
    /// otherwise. The first directory that fails to render or decode aborts
    /// the build.
    pub async fn build(
        &self,
        tests: &VirtualFileTree,
        patterns: &[String],
        tests_folder: &str,
        name_prefix: &str,
        host_root: Option<&Path>,
    ) -> TestResult<Vec<TestCase>> {
        let dirs = discover_test_directories(tests, patterns, tests_folder, name_prefix)?;

        let mut cases = Vec::new();
        for dir in dirs {
            let base = Arc::new(tests.subtree(&dir)?);
            let Some(language) = self.identifier.identify(base.as_ref()) else {
                let e2e_file = path::join(&dir, E2E_FILE);
                if tests.is_file(&e2e_file) {
                    let test = load_e2e(tests, &e2e_file)?;
                    tracing::info!(%dir, name = %test.metadata.name, "loaded e2e test file");
                    cases.push(TestCase::E2E(Box::new(test)));
                } else {
                    tracing::debug!(%dir, "no supported test language, skipping");
                }
                continue;
            };
            let Some(renderer) = self.renderers.create(language, &self.config) else {
                tracing::warn!(%dir, %language, "no renderer registered, skipping");
                continue;
            };

            let mut work = Overlay::new(base);
            let host_path = host_root.map(|root| root.join(&dir));
            renderer
                .render(&mut work, host_path.as_deref(), self.runner)
                .await
                .map_err(|source| TestError::Render {
                    dir: dir.clone(),
                    source,
                })?;

            let rendered = work
                .read(RENDERED_FILE)
                .map_err(|_| TestError::MissingOutput { dir: dir.clone() })?;
            let decoded = decode_items(rendered, self.config.decode_mode).map_err(|source| {
                TestError::Decode {
                    dir: dir.clone(),
                    source,
                }
            })?;

            for case in decoded {
                if let Err(source) = case.validate() {
                    if self.config.decode_mode == DecodeMode::Strict {
                        return Err(TestError::Decode { dir, source });
                    }
                    tracing::warn!(%dir, name = case.name(), error = %source, "invalid test case");
                }
                cases.push(case);
            }
            tracing::info!(%dir, %language, "built test directory");
        }
        Ok(cases)
    }
}

/// Reads and validates a single end-to-end test file.
pub fn load_e2e(fs: &dyn FileSystem, path: &str) -> TestResult<E2ETest> {
    let bytes = fs.read(path).map_err(|source| TestError::ReadE2E {
        path: path.to_string(),
        source,
    })?;
    parse_e2e(bytes).map_err(|source| TestError::ParseE2E {
        path: path.to_string(),
        source,
    })
}
