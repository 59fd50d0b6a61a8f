//! Manifest collection shared by every generator.

use crossgen_vfs::{path, FileSystem};

use crate::error::{SpecError, SpecResult};
use crate::extract::{extract_openapi, ExtractedSpec};
use crate::manifest::{classify, CustomResourceDefinition, Manifest};
use crate::xrd::derive_crds;

/// A CRD ready to be staged for a container generator.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedCrd {
    /// Path of the manifest the CRD came from.
    pub source: String,
    /// Relative path the CRD is staged at.
    pub staged_path: String,
    /// Bytes to stage.
    pub contents: Vec<u8>,
    /// The parsed definition.
    pub crd: CustomResourceDefinition,
}

/// Returns true if `file` is excluded by name or by path prefix.
pub fn is_excluded(file: &str, exclude: &[String]) -> bool {
    let name = path::file_name(file);
    exclude
        .iter()
        .filter(|excl| !excl.is_empty())
        .any(|excl| name == excl || file.starts_with(excl.trim_start_matches("./")))
}

fn is_yaml(file: &str) -> bool {
    file.ends_with(".yaml") || file.ends_with(".yml")
}

/// Walks `fs` and returns every CRD, including those derived from XRDs.
///
/// Only `.yaml`/`.yml` files are considered; documents of other kinds are
/// ignored. A CRD file with a single document is staged verbatim; every
/// other CRD is re-serialized. XRDs stage `<path>-xr.yaml` and, when they
/// offer a claim, `<path>-claim.yaml`.
pub fn collect_crds(fs: &dyn FileSystem, exclude: &[String]) -> SpecResult<Vec<StagedCrd>> {
    let mut staged = Vec::new();

    for file in fs.paths() {
        if !is_yaml(&file) || is_excluded(&file, exclude) {
            continue;
        }
        let bytes = fs.read(&file).map_err(|source| SpecError::ReadFailed {
            path: file.clone(),
            source,
        })?;
        let manifests = classify(&file, bytes)?;
        let single = manifests.len() == 1;

        for (index, manifest) in manifests.into_iter().enumerate() {
            match manifest {
                Manifest::Crd(crd) => {
                    let (staged_path, contents) = if single {
                        (file.clone(), bytes.to_vec())
                    } else {
                        (format!("{}-{}.yaml", file, index), crd.to_yaml()?.into_bytes())
                    };
                    staged.push(StagedCrd {
                        source: file.clone(),
                        staged_path,
                        contents,
                        crd: *crd,
                    });
                }
                Manifest::Xrd(xrd) => {
                    let derived = derive_crds(&xrd)?;
                    let base = if single {
                        file.clone()
                    } else {
                        format!("{}-{}", file, index)
                    };
                    let mut push = |suffix: &str, crd: CustomResourceDefinition| -> SpecResult<()> {
                        staged.push(StagedCrd {
                            source: file.clone(),
                            staged_path: format!("{}-{}.yaml", base, suffix),
                            contents: crd.to_yaml()?.into_bytes(),
                            crd,
                        });
                        Ok(())
                    };
                    push("xr", derived.composite)?;
                    if let Some(claim) = derived.claim {
                        push("claim", claim)?;
                    }
                }
                Manifest::Other { kind } => {
                    tracing::trace!(path = %file, kind = ?kind, "ignoring manifest");
                }
            }
        }
    }

    Ok(staged)
}

/// Walks `fs` and extracts one OpenAPI document per served CRD version.
pub fn collect_openapis(fs: &dyn FileSystem, exclude: &[String]) -> SpecResult<Vec<ExtractedSpec>> {
    let mut specs = Vec::new();
    for staged in collect_crds(fs, exclude)? {
        for (version, document) in extract_openapi(&staged.crd)? {
            specs.push(ExtractedSpec {
                group: staged.crd.spec.group.clone(),
                kind: staged.crd.spec.names.kind.clone(),
                version,
                source: staged.source.clone(),
                document,
            });
        }
    }
    tracing::debug!(documents = specs.len(), "collected OpenAPI documents");
    Ok(specs)
}
