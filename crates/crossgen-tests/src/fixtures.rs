//! Test fixture utilities for creating synthetic Crossplane projects.

use std::fs;
use std::path::{Path, PathBuf};

use crossgen_vfs::VirtualFileTree;
use tempfile::TempDir;

/// A CRD for `Widget` in `platform.example.com/v1` with a string `name`.
pub const WIDGET_CRD: &str = r#"apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: widgets.platform.example.com
spec:
  group: platform.example.com
  names:
    kind: Widget
    plural: widgets
  scope: Namespaced
  versions:
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
              type: object
              properties:
                name:
                  type: string
"#;

/// An XRD for `XBucket` (claim `Bucket`) in `platform.acme.co/v1alpha1`.
pub const XBUCKET_XRD: &str = r#"apiVersion: apiextensions.crossplane.io/v1
kind: CompositeResourceDefinition
metadata:
  name: xbuckets.platform.acme.co
spec:
  group: platform.acme.co
  names:
    kind: XBucket
    plural: xbuckets
  claimNames:
    kind: Bucket
    plural: buckets
  versions:
    - name: v1alpha1
      served: true
      referenceable: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
              type: object
              properties:
                region:
                  type: string
                sizeGb:
                  type: number
"#;

/// A composition referencing `XBucket`; not a definition.
pub const XBUCKET_COMPOSITION: &str = r#"apiVersion: apiextensions.crossplane.io/v1
kind: Composition
metadata:
  name: xbuckets-aws
spec:
  compositeTypeRef:
    apiVersion: platform.acme.co/v1alpha1
    kind: XBucket
  mode: Pipeline
  pipeline: []
"#;

/// Rendered test output with one composition test and one unrelated item.
pub const RENDERED_TESTS: &str = r#"items:
  - apiVersion: meta.dev.crossgen.io/v1alpha1
    kind: CompositionTest
    metadata:
      name: bucket-default
    spec:
      compositionPath: apis/xbucket/composition.yaml
      xrdPath: apis/xbucket/definition.yaml
      xrPath: examples/xbucket.yaml
      timeoutSeconds: 60
  - apiVersion: meta.dev.crossgen.io/v1alpha1
    kind: Bogus
    metadata:
      name: not-a-test
"#;

/// An in-memory project holding both definitions, a composition, and a README.
pub fn definitions_tree() -> VirtualFileTree {
    VirtualFileTree::from_files([
        ("apis/widget/crd.yaml", WIDGET_CRD),
        ("apis/xbucket/definition.yaml", XBUCKET_XRD),
        ("apis/xbucket/composition.yaml", XBUCKET_COMPOSITION),
        ("README.md", "# platform\n"),
    ])
    .expect("Failed to build definitions tree")
}

/// A project on disk.
pub struct ProjectFixture {
    pub root: TempDir,
}

impl ProjectFixture {
    /// Create a new empty project.
    pub fn new() -> Self {
        Self {
            root: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Create a project holding both definitions and a composition.
    pub fn with_definitions() -> Self {
        let fixture = Self::new();
        fixture.add_file("apis/widget/crd.yaml", WIDGET_CRD);
        fixture.add_file("apis/xbucket/definition.yaml", XBUCKET_XRD);
        fixture.add_file("apis/xbucket/composition.yaml", XBUCKET_COMPOSITION);
        fixture
    }

    /// Get the project root path.
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Add a file to the project, creating parent directories.
    pub fn add_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// Add an empty directory to the project.
    pub fn add_dir(&self, relative: &str) -> PathBuf {
        let path = self.root.path().join(relative);
        fs::create_dir_all(&path).expect("Failed to create dir");
        path
    }

    /// Load the project into memory.
    pub fn tree(&self) -> VirtualFileTree {
        VirtualFileTree::load_dir(self.path()).expect("Failed to load project")
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}
