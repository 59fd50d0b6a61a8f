//! End-to-End Scaffolding Tests for crossgen
//!
//! Tests verify:
//! - Test-case models are generated and cached before scaffolding
//! - Scaffolded KCL tests import every cached model package
//! - Scaffolded tests link to the cached models
//! - Existing tests are only overwritten on request
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p crossgen-tests --test e2e_scaffold
//! ```

use crossgen_cli::generate::GenerateConfig;
use crossgen_cli::meta_schemas::generate_meta_schemas;
use crossgen_cli::registry::CacheRegistry;
use crossgen_cli::scaffold::{
    kcl_imports, render_test, write_test, EmbeddedAssets, ScaffoldError, ScaffoldRequest,
    MODELS_LINK,
};
use crossgen_cli::testing::{DefaultIdentifier, Identifier, TestLanguage};
use crossgen_spec::Language;
use crossgen_tests::fixtures::ProjectFixture;
use crossgen_tests::harness::fake_generators;
use crossgen_vfs::{FileSystem, VirtualFileTree};
use pretty_assertions::assert_eq;

fn request(name: &str, language: TestLanguage) -> ScaffoldRequest {
    ScaffoldRequest {
        name: name.to_string(),
        language,
        e2e: false,
    }
}

#[tokio::test]
async fn test_scaffold_kcl_test_against_cached_models() {
    let project = ProjectFixture::new();
    let cache = project.path().join(".crossgen");
    let mut registry = CacheRegistry::new(&cache);
    generate_meta_schemas(&fake_generators(), &mut registry, &GenerateConfig::default())
        .await
        .unwrap();

    let kcl_dir = registry.language_dir(Language::Kcl);
    assert!(kcl_dir
        .join("models/io/crossgen/dev/meta/v1alpha1/compositiontest.k")
        .is_file());
    assert!(registry
        .language_dir(Language::Python)
        .join("models")
        .is_dir());

    let models = VirtualFileTree::load_dir(&kcl_dir).unwrap();
    let imports = kcl_imports(&models);
    let files = render_test(
        &EmbeddedAssets,
        &request("bucket", TestLanguage::Kcl),
        &imports,
    )
    .unwrap();

    let main = files.read_to_string("main.k").unwrap();
    assert!(main.contains("import models.io.crossgen.dev.meta.v1alpha1 as metav1alpha1\n"));
    assert!(main.contains("metadata.name = \"test-bucket\""));
    assert!(!main.contains("{{"));
    assert_eq!(DefaultIdentifier.identify(&files), Some(TestLanguage::Kcl));

    let target = project.path().join("tests/test-bucket");
    let models_dir = kcl_dir.join("models");
    let written = write_test(&files, &target, &models_dir, false).unwrap();
    assert_eq!(written, 2);
    assert!(target.join("main.k").is_file());
    assert!(target.join("kcl.mod").is_file());

    #[cfg(unix)]
    {
        let link = target.join(MODELS_LINK);
        assert_eq!(std::fs::read_link(&link).unwrap(), models_dir);
        assert!(link
            .join("io/crossgen/dev/meta/v1alpha1/compositiontest.k")
            .is_file());
    }
}

#[test]
fn test_scaffold_python_test() {
    let project = ProjectFixture::new();
    let models_dir = project.add_dir(".crossgen/python/models");

    let files = render_test(
        &EmbeddedAssets,
        &request("network", TestLanguage::Python),
        &[],
    )
    .unwrap();
    assert_eq!(DefaultIdentifier.identify(&files), Some(TestLanguage::Python));

    let target = project.path().join("tests/test-network");
    write_test(&files, &target, &models_dir, false).unwrap();
    assert!(target.join("main.py").is_file());
    assert!(target.join("requirements.txt").is_file());
}

#[test]
fn test_scaffold_refuses_to_overwrite_without_force() {
    let project = ProjectFixture::new();
    let models_dir = project.add_dir(".crossgen/kcl/models");
    let existing = project.add_file("tests/test-bucket/main.k", "# hand written\n");
    let target = existing.parent().unwrap().to_path_buf();

    let files = render_test(&EmbeddedAssets, &request("bucket", TestLanguage::Kcl), &[]).unwrap();
    let err = write_test(&files, &target, &models_dir, false).unwrap_err();
    assert!(matches!(err, ScaffoldError::NotEmpty(ref dir) if *dir == target), "{err}");
    assert_eq!(std::fs::read_to_string(&existing).unwrap(), "# hand written\n");

    write_test(&files, &target, &models_dir, true).unwrap();
    assert_ne!(std::fs::read_to_string(&existing).unwrap(), "# hand written\n");
}

#[test]
fn test_scaffold_rejects_invalid_names() {
    let long = "a".repeat(64);
    for name in ["Bucket", "bucket_1", "bucket-", long.as_str()] {
        let err = render_test(&EmbeddedAssets, &request(name, TestLanguage::Kcl), &[]).unwrap_err();
        assert!(matches!(err, ScaffoldError::InvalidName { .. }), "{name}: {err}");
    }
}
