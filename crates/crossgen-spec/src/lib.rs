//! crossgen manifest model
//!
//! This crate holds everything the generators share about their input:
//!
//! - [`manifest`] - CRD and XRD types and per-document classification
//! - [`xrd`] - derivation of composite and claim CRDs from an XRD
//! - [`openapi`] - the OpenAPI v3 document model
//! - [`extract`] - CRD version to OpenAPI document extraction
//! - [`meta`] - the shared Kubernetes `meta/v1` schemas
//! - [`collect`] - walking a source tree for definitions
//! - [`testcase`] - composition and end-to-end test types and decoding
//! - [`versions`] - known Kubernetes API version names
//! - [`error`] - error types and the [`BackendError`] trait
//!
//! # Example
//!
//! ```
//! use crossgen_spec::collect::collect_openapis;
//! use crossgen_vfs::VirtualFileTree;
//!
//! let fs = VirtualFileTree::new();
//! assert!(collect_openapis(&fs, &[]).unwrap().is_empty());
//! ```

pub mod collect;
pub mod error;
pub mod extract;
pub mod language;
pub mod manifest;
pub mod meta;
pub mod openapi;
pub mod testcase;
pub mod versions;
pub mod xrd;

pub use collect::{collect_crds, collect_openapis, is_excluded, StagedCrd};
pub use error::{BackendError, SpecError, SpecResult};
pub use extract::{extract_openapi, schema_name, ExtractedSpec};
pub use language::Language;
pub use manifest::{classify, CompositeResourceDefinition, CustomResourceDefinition, Manifest};
pub use openapi::{AdditionalProperties, OpenApiDocument, Schema};
pub use testcase::{
    decode_items, parse_e2e, CompositionTest, DecodeError, DecodeMode, DecodedItem, E2ETest,
    TestCase,
};
pub use versions::is_known_api_version;
pub use xrd::{derive_crds, DerivedCrds};
