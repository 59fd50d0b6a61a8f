//! crossgen Go backend
//!
//! Generates Go structs for every CRD and XRD in a source tree. The output is
//! one Go module rooted at `models/`:
//!
//! - `models/go.mod` declares the module
//! - `models/io/k8s/meta/v1/meta.go` holds the Kubernetes `meta/v1` types,
//!   merged once across all inputs
//! - `models/<reversed group>/<version>/<kind>.go` holds one kind, importing
//!   the shared `meta/v1` package as `metav1`
//!
//! All fields are optional pointers so that callers can set only the fields
//! they own, and every `number` maps to Go's `int`.
//!
//! # Example
//!
//! ```
//! use crossgen_backend_go::generate;
//! use crossgen_vfs::VirtualFileTree;
//!
//! let fs = VirtualFileTree::new();
//! assert!(generate(&fs, &[]).unwrap().is_none());
//! ```

use crossgen_spec::collect::collect_openapis;
use crossgen_spec::openapi::{is_meta_v1, OpenApiDocument};
use crossgen_vfs::{FileSystem, VirtualFileTree};

pub mod emit;
pub mod error;
pub mod mutate;
pub mod naming;

pub use error::{GoError, GoResult};

/// Module path of the generated Go module.
pub const MODULE_PATH: &str = "dev.crossgen.io/models";

/// Go toolchain version written to `go.mod`.
pub const GO_VERSION: &str = "1.23";

/// Generates Go models for every definition in `fs`.
///
/// Returns `None` when the tree holds no CRDs or XRDs.
pub fn generate(fs: &dyn FileSystem, exclude: &[String]) -> GoResult<Option<VirtualFileTree>> {
    let specs = collect_openapis(fs, exclude)?;
    if specs.is_empty() {
        tracing::debug!("no definitions found, skipping Go generation");
        return Ok(None);
    }

    let mut out = VirtualFileTree::new();
    out.write(
        "models/go.mod",
        format!("module {}\n\ngo {}\n", MODULE_PATH, GO_VERSION).as_bytes(),
    )?;

    let mut meta = OpenApiDocument::new("io.k8s.apimachinery.pkg.apis.meta.v1", "v1");
    for spec in &specs {
        for (name, schema) in spec.document.schemas() {
            if is_meta_v1(name) {
                meta.schemas_mut().entry(name.clone()).or_insert_with(|| schema.clone());
            }
        }
    }
    mutate::rename_types(&mut meta);
    mutate::replace_number_with_int(&mut meta);
    mutate::remove_required(&mut meta);
    let code = emit::emit(&meta, "v1")?;
    out.write(&naming::schema_path("meta.k8s.io", "meta", "v1"), code.as_bytes())?;

    for spec in specs {
        let path = naming::schema_path(&spec.group, &spec.kind, &spec.version);
        let mut doc = spec.document;
        mutate::rename_types(&mut doc);
        mutate::replace_number_with_int(&mut doc);
        mutate::remove_required(&mut doc);
        mutate::reference_meta_types(&mut doc);
        mutate::remove_meta_schemas(&mut doc);
        mutate::keep_only_components(&mut doc);

        let code = emit::emit(&doc, &spec.version)?;
        tracing::debug!(%path, source = %spec.source, "generated Go model");
        out.write(&path, code.as_bytes())?;
    }

    tracing::info!(files = out.len(), "generated Go models");
    Ok(Some(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BUCKET: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: xbuckets.platform.acme.co
spec:
  group: platform.acme.co
  names: {kind: XBucket, plural: xbuckets}
  versions:
    - name: v1alpha1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          required: [spec]
          properties:
            spec:
              type: object
              required: [region]
              properties:
                region: {type: string}
                sizeGb: {type: number}
"#;

    const QUEUE: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: queues.platform.acme.co
spec:
  group: platform.acme.co
  names: {kind: Queue, plural: queues}
  versions:
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec: {type: object, properties: {fifo: {type: boolean}}}
"#;

    fn tree() -> VirtualFileTree {
        VirtualFileTree::from_files([("apis/bucket.yaml", BUCKET), ("apis/queue.yaml", QUEUE)])
            .unwrap()
    }

    #[test]
    fn test_empty_tree_yields_nothing() {
        let fs = VirtualFileTree::from_files([("README.md", "hi")]).unwrap();
        assert!(generate(&fs, &[]).unwrap().is_none());
    }

    #[test]
    fn test_layout() {
        let out = generate(&tree(), &[]).unwrap().unwrap();
        assert_eq!(
            out.paths(),
            vec![
                "models/co/acme/platform/v1/queue.go",
                "models/co/acme/platform/v1alpha1/xbucket.go",
                "models/go.mod",
                "models/io/k8s/meta/v1/meta.go",
            ]
        );
        assert_eq!(
            out.read_to_string("models/go.mod").unwrap(),
            "module dev.crossgen.io/models\n\ngo 1.23\n"
        );
    }

    #[test]
    fn test_meta_types_defined_once() {
        let out = generate(&tree(), &[]).unwrap().unwrap();
        let meta = out.read_to_string("models/io/k8s/meta/v1/meta.go").unwrap();
        assert_eq!(meta.matches("type ObjectMeta struct").count(), 1);
        assert!(meta.contains("package v1\n"));

        for file in [
            "models/co/acme/platform/v1/queue.go",
            "models/co/acme/platform/v1alpha1/xbucket.go",
        ] {
            let code = out.read_to_string(file).unwrap();
            assert!(!code.contains("type ObjectMeta struct"), "{file}");
            assert!(code.contains("metav1 \"dev.crossgen.io/models/io/k8s/meta/v1\""), "{file}");
            assert!(code.contains("*metav1.ObjectMeta"), "{file}");
        }
    }

    #[test]
    fn test_fields_are_optional_and_numbers_are_int() {
        let out = generate(&tree(), &[]).unwrap().unwrap();
        let code = out.read_to_string("models/co/acme/platform/v1alpha1/xbucket.go").unwrap();
        assert!(code.contains("package v1alpha1\n"));
        assert!(code.contains("\tRegion *string `json:\"region,omitempty\"`\n"));
        assert!(code.contains("\tSizeGb *int `json:\"sizeGb,omitempty\"`\n"));
        assert!(code.contains("\tSpec *XBucketSpec `json:\"spec,omitempty\"`\n"));
        assert!(code.contains("\tItems []XBucket `json:\"items,omitempty\"`\n"));
    }

    #[test]
    fn test_exclusions() {
        let out = generate(&tree(), &["apis/queue.yaml".to_string()]).unwrap().unwrap();
        assert!(!out.is_file("models/co/acme/platform/v1/queue.go"));
        assert!(out.is_file("models/co/acme/platform/v1alpha1/xbucket.go"));
    }
}
