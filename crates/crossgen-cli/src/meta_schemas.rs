//! Models for the test-case kinds themselves.
//!
//! Test authors write `CompositionTest` and `E2ETest` objects in KCL or
//! Python. The CRDs of both kinds are embedded here and run through the KCL
//! and Python backends so that their models sit in the registry next to the
//! project's own.

use std::sync::Arc;

use crossgen_runner::SchemaRunner;
use crossgen_spec::Language;
use crossgen_vfs::{Overlay, VfsResult, VirtualFileTree};

use crate::generate::{GenerateConfig, GenerateError};
use crate::registry::ModelRegistry;

const COMPOSITION_TEST_CRD: &str = include_str!("../assets/meta/compositiontest.yaml");
const E2E_TEST_CRD: &str = include_str!("../assets/meta/e2etest.yaml");

/// Returns a tree holding the embedded CRDs.
pub fn meta_crds() -> VfsResult<VirtualFileTree> {
    VirtualFileTree::from_files([
        ("crds/compositiontest.yaml", COMPOSITION_TEST_CRD),
        ("crds/e2etest.yaml", E2E_TEST_CRD),
    ])
}

/// Generates KCL and Python models for the test-case kinds and registers them.
pub async fn generate_meta_schemas(
    runner: &dyn SchemaRunner,
    registry: &mut dyn ModelRegistry,
    config: &GenerateConfig,
) -> Result<(), GenerateError> {
    let base = Arc::new(meta_crds()?);

    let kcl = {
        let overlay = Overlay::new(Arc::clone(&base));
        async move {
            crossgen_backend_kcl::generate(&overlay, &[], runner, &config.kcl)
                .await
                .map_err(GenerateError::from)
        }
    };
    let python = {
        let overlay = Overlay::new(Arc::clone(&base));
        async move {
            crossgen_backend_python::generate(&overlay, &[], runner, &config.python)
                .await
                .map_err(GenerateError::from)
        }
    };
    let (kcl, python) = tokio::try_join!(kcl, python)?;

    for (language, models) in [(Language::Kcl, kcl), (Language::Python, python)] {
        if let Some(models) = models {
            registry.add_models(language, &models)?;
        }
    }
    tracing::info!("generated test-case models");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MemoryRegistry;
    use crossgen_runner::StubRunner;
    use crossgen_spec::collect_crds;
    use crossgen_vfs::FileSystem;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_embedded_crds_parse() {
        let tree = meta_crds().unwrap();
        let crds = collect_crds(&tree, &[]).unwrap();
        let kinds: Vec<&str> = crds.iter().map(|c| c.crd.spec.names.kind.as_str()).collect();
        assert_eq!(kinds, vec!["CompositionTest", "E2ETest"]);
        assert!(crds.iter().all(|c| c.crd.spec.group == crossgen_spec::testcase::TEST_GROUP));
    }

    #[tokio::test]
    async fn test_generates_kcl_and_python_only() {
        let runner = StubRunner::new(|fs, request| {
            if request.image.contains("kcl") {
                fs.write(
                    "models/v1alpha1/meta_dev_crossgen_io_v1alpha1_composition_test.k",
                    b"schema CompositionTest:\n",
                )?;
            } else {
                fs.write(
                    "generated/meta_dev_crossgen_io_v1alpha1_compositiontest/io/crossgen/dev/meta/v1alpha1.py",
                    b"class CompositionTest: ...\n",
                )?;
            }
            Ok(())
        });
        let mut registry = MemoryRegistry::new();
        generate_meta_schemas(&runner, &mut registry, &GenerateConfig::default())
            .await
            .unwrap();

        assert_eq!(registry.languages(), vec![Language::Kcl, Language::Python]);
        assert!(registry
            .get(Language::Kcl)
            .unwrap()
            .is_file("models/io/crossgen/dev/meta/v1alpha1/compositiontest.k"));
        assert_eq!(runner.requests().len(), 2);
    }
}
