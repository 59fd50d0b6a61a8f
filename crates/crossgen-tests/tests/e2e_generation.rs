//! End-to-End Generation Tests for crossgen
//!
//! Tests verify:
//! - Every backend produces its layout from one project
//! - Empty projects produce nothing, without starting containers
//! - Kubernetes meta/v1 types are emitted once and shared
//! - Generated models land in the on-disk model cache
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p crossgen-tests --test e2e_generation
//! ```

use std::sync::Arc;

use crossgen_cli::generate::{generate_models, GenerateConfig};
use crossgen_cli::registry::{CacheRegistry, MemoryRegistry, ModelRegistry};
use crossgen_runner::StubRunner;
use crossgen_spec::Language;
use crossgen_tests::fixtures::{definitions_tree, ProjectFixture, WIDGET_CRD, XBUCKET_XRD};
use crossgen_tests::harness::fake_generators;
use crossgen_vfs::{FileSystem, VirtualFileTree};
use pretty_assertions::assert_eq;

const OBJECT_META_SCHEMA: &str = "io-k8s-apimachinery-pkg-apis-meta-v1-ObjectMeta.schema.json";

// ============================================================================
// Pipeline
// ============================================================================

#[tokio::test]
async fn test_all_languages_generated_and_registered() {
    let runner = fake_generators();
    let mut registry = MemoryRegistry::new();
    let summary = generate_models(
        Arc::new(definitions_tree()),
        &runner,
        &mut registry,
        &GenerateConfig::default(),
    )
    .await
    .unwrap();

    assert_eq!(
        summary.files.keys().copied().collect::<Vec<_>>(),
        Language::ALL.to_vec()
    );
    assert_eq!(registry.languages(), Language::ALL.to_vec());
    assert!(summary.files.values().all(|files| *files > 0));

    // One job per containerized backend.
    let images: Vec<String> = runner.requests().into_iter().map(|r| r.image).collect();
    assert_eq!(images.len(), 2);
    assert!(images.iter().any(|image| image.contains("kcl")));
    assert!(images.iter().any(|image| image.contains("datamodel-code-generator")));
}

#[tokio::test]
async fn test_kcl_xbucket_scenario() {
    let runner = fake_generators();
    let fs = VirtualFileTree::from_files([("apis/xbucket/definition.yaml", XBUCKET_XRD)]).unwrap();
    let models = crossgen_backend_kcl::generate(
        &fs,
        &[],
        &runner,
        &crossgen_backend_kcl::KclConfig::default(),
    )
    .await
    .unwrap()
    .expect("an XRD yields KCL models");

    let paths = models.paths();
    assert!(paths
        .iter()
        .any(|p| p.starts_with("models/co/acme/platform/") && p.ends_with(".k")));
    assert!(models.is_file("models/co/acme/platform/v1alpha1/xbucket.k"));
    assert!(models.is_file("models/co/acme/platform/v1alpha1/bucket.k"));
    assert!(paths.iter().any(|p| p.starts_with("models/k8s/")));
    assert!(!models.is_file("models/k8s/apimachinery/pkg/apis/meta/v1/managed_fields_entry.k"));

    let mut registry = MemoryRegistry::new();
    registry.add_models(Language::Kcl, &models).unwrap();
    assert_eq!(registry.languages(), vec![Language::Kcl]);
}

#[test]
fn test_json_schema_widget_scenario() {
    let fs = VirtualFileTree::from_files([("crds/widget.yaml", WIDGET_CRD)]).unwrap();
    let models = crossgen_backend_json::generate(&fs, &[]).unwrap().unwrap();

    let text = models
        .read_to_string("models/platform-example-com-v1-Widget.schema.json")
        .unwrap();
    let schema: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(schema["additionalProperties"], serde_json::Value::Bool(false));
    assert_eq!(
        schema["properties"]["spec"]["properties"]["name"]["type"],
        serde_json::json!("string")
    );
}

#[tokio::test]
async fn test_python_packages_split_per_kind() {
    let runner = fake_generators();
    let fs = VirtualFileTree::from_files([("apis/xbucket/definition.yaml", XBUCKET_XRD)]).unwrap();
    let models = crossgen_backend_python::generate(
        &fs,
        &[],
        &runner,
        &crossgen_backend_python::PythonConfig::default(),
    )
    .await
    .unwrap()
    .unwrap();

    assert!(models.is_file("models/co/acme/platform/xbucket/v1alpha1.py"));
    assert!(models.is_file("models/co/acme/platform/bucket/v1alpha1.py"));
    assert!(models.is_file("models/io/k8s/apimachinery/pkg/apis/meta/v1.py"));
}

// ============================================================================
// Empty input
// ============================================================================

#[tokio::test]
async fn test_empty_project_generates_nothing() {
    let runner = StubRunner::noop();
    let fs = VirtualFileTree::from_files([("README.md", "# nothing\n")]).unwrap();

    assert!(crossgen_backend_go::generate(&fs, &[]).unwrap().is_none());
    assert!(crossgen_backend_json::generate(&fs, &[]).unwrap().is_none());
    assert!(crossgen_backend_kcl::generate(
        &fs,
        &[],
        &runner,
        &crossgen_backend_kcl::KclConfig::default()
    )
    .await
    .unwrap()
    .is_none());
    assert!(crossgen_backend_python::generate(
        &fs,
        &[],
        &runner,
        &crossgen_backend_python::PythonConfig::default()
    )
    .await
    .unwrap()
    .is_none());
    assert!(runner.requests().is_empty());

    let mut registry = MemoryRegistry::new();
    let summary = generate_models(Arc::new(fs), &runner, &mut registry, &GenerateConfig::default())
        .await
        .unwrap();
    assert!(summary.is_empty());
    assert!(registry.languages().is_empty());
}

#[tokio::test]
async fn test_excluded_definitions_are_skipped() {
    let runner = fake_generators();
    let mut registry = MemoryRegistry::new();
    let config = GenerateConfig {
        exclude: vec!["apis/xbucket".to_string()],
        ..GenerateConfig::default()
    };
    generate_models(Arc::new(definitions_tree()), &runner, &mut registry, &config)
        .await
        .unwrap();

    let go = registry.get(Language::Go).unwrap();
    assert!(go.is_file("models/com/example/platform/v1/widget.go"));
    assert!(!go.paths().iter().any(|p| p.contains("xbucket")));
}

// ============================================================================
// Shared meta/v1 types
// ============================================================================

#[test]
fn test_meta_types_emitted_once() {
    let fs = definitions_tree();

    let go = crossgen_backend_go::generate(&fs, &[]).unwrap().unwrap();
    let meta = go.read_to_string("models/io/k8s/meta/v1/meta.go").unwrap();
    assert_eq!(meta.matches("type ObjectMeta struct").count(), 1);
    let kinds: Vec<String> = go
        .paths()
        .into_iter()
        .filter(|p| p.ends_with(".go") && !p.starts_with("models/io/k8s/"))
        .collect();
    assert!(kinds.len() >= 3, "XBucket, Bucket and Widget: {kinds:?}");
    for file in &kinds {
        let code = go.read_to_string(file).unwrap();
        assert!(!code.contains("type ObjectMeta struct"), "{file}");
        assert!(code.contains("metav1.ObjectMeta"), "{file}");
    }

    let json = crossgen_backend_json::generate(&fs, &[]).unwrap().unwrap();
    let object_meta: Vec<String> = json
        .paths()
        .into_iter()
        .filter(|p| p.ends_with("-ObjectMeta.schema.json"))
        .collect();
    assert_eq!(object_meta, vec![format!("models/{}", OBJECT_META_SCHEMA)]);
    for kind in ["platform-example-com-v1-Widget", "platform-acme-co-v1alpha1-XBucket"] {
        let text = json
            .read_to_string(&format!("models/{}.schema.json", kind))
            .unwrap();
        assert!(text.contains(OBJECT_META_SCHEMA), "{kind}");
    }
}

// ============================================================================
// Model cache
// ============================================================================

#[tokio::test]
async fn test_models_written_to_cache() {
    let project = ProjectFixture::with_definitions();
    let cache = project.path().join(".crossgen");
    let mut registry = CacheRegistry::new(&cache);

    let summary = generate_models(
        Arc::new(project.tree()),
        &fake_generators(),
        &mut registry,
        &GenerateConfig::default(),
    )
    .await
    .unwrap();

    assert_eq!(summary.files.len(), 4);
    assert!(cache.join("go/models/go.mod").is_file());
    assert!(cache
        .join("json/models/platform-example-com-v1-Widget.schema.json")
        .is_file());
    assert!(cache.join("kcl/models/co/acme/platform/v1alpha1/xbucket.k").is_file());
    assert!(cache
        .join("python/models/co/acme/platform/xbucket/v1alpha1.py")
        .is_file());

    // The project itself is untouched.
    assert!(!project.path().join("models").exists());
}
