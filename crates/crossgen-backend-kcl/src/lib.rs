//! crossgen KCL backend
//!
//! Generates KCL schemas by running `kcl import -m crd` in a sandbox over every
//! CRD in the source tree, XRDs included through their derived composite and
//! claim CRDs. The importer's flat output is then restructured so that kinds
//! from different groups never collide; see [`structure`].
//!
//! The result holds `models/kcl.mod`, the shared `models/k8s/...` schemas,
//! and one `models/<reversed group>/<version>/<kind>.k` per kind.

use crossgen_runner::{SandboxRequest, SchemaRunner};
use crossgen_spec::collect::collect_crds;
use crossgen_vfs::{copy_dir, FileSystem, VirtualFileTree};

pub mod error;
pub mod structure;

pub use error::{KclError, KclResult};

/// Image carrying the KCL importer.
pub const DEFAULT_KCL_IMAGE: &str = "xpkg.upbound.io/upbound/kcl:v0.10.6";

/// Folder the CRDs are nested under inside the sandbox.
pub const BASE_FOLDER: &str = "workdir";

const IMPORT_SCRIPT: &str = r#"find . -name "*.yaml" -exec kcl import -m crd -s {} \;"#;
const MODELS_FOLDER: &str = "models";
const SORTED_FOLDER: &str = "sorted";

/// Configuration for KCL generation.
#[derive(Debug, Clone)]
pub struct KclConfig {
    /// Image carrying the KCL importer.
    pub image: String,
}

impl Default for KclConfig {
    fn default() -> Self {
        Self {
            image: DEFAULT_KCL_IMAGE.to_string(),
        }
    }
}

impl KclConfig {
    /// Sets the importer image.
    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }
}

/// Generates KCL schemas for every definition in `fs`.
///
/// Returns `None` without starting a container when the tree holds no CRDs
/// or XRDs.
pub async fn generate(
    fs: &dyn FileSystem,
    exclude: &[String],
    runner: &dyn SchemaRunner,
    config: &KclConfig,
) -> KclResult<Option<VirtualFileTree>> {
    let staged = collect_crds(fs, exclude)?;
    if staged.is_empty() {
        tracing::debug!("no definitions found, skipping KCL generation");
        return Ok(None);
    }

    let mut work = VirtualFileTree::new();
    for crd in &staged {
        work.write(&crd.staged_path, &crd.contents)?;
    }

    let request =
        SandboxRequest::new(&config.image, ["sh", "-c", IMPORT_SCRIPT]).base_folder(BASE_FOLDER);
    tracing::info!(image = %config.image, crds = staged.len(), "importing CRDs into KCL");
    runner.generate(&mut work, &request).await?;

    structure::transform_structure(&mut work, MODELS_FOLDER, SORTED_FOLDER)?;

    let mut out = VirtualFileTree::new();
    let files = copy_dir(&work, SORTED_FOLDER, &mut out, MODELS_FOLDER)?;
    tracing::info!(files, "generated KCL schemas");
    Ok(Some(out))
}
