//! crossgen Python backend
//!
//! Generates pydantic models by running `datamodel-codegen` in a sandbox.
//! Every CRD (XRDs included through their derived CRDs) is converted to one
//! OpenAPI document per served version. Component names are re-keyed from
//! `<group>.<version>.<Kind>` to the reversed-group form
//! (`co.acme.platform.v1alpha1.XBucket`) so that the generator lays modules
//! out as Python packages. The generator's per-document packages are then
//! merged; see [`restructure`].

use crossgen_runner::{SandboxRequest, SchemaRunner};
use crossgen_spec::collect::collect_crds;
use crossgen_spec::extract::extract_openapi;
use crossgen_spec::openapi::is_meta_v1;
use crossgen_spec::SpecError;
use crossgen_vfs::{copy_dir, FileSystem, VirtualFileTree};

pub mod error;
pub mod restructure;

pub use error::{PythonError, PythonResult};

/// Image carrying `datamodel-codegen`.
pub const DEFAULT_PYTHON_IMAGE: &str = "xpkg.upbound.io/upbound/datamodel-code-generator:v0.26.3";

/// Folder the documents are nested under inside the sandbox.
pub const BASE_FOLDER: &str = "workdir";

const GENERATE_SCRIPT: &str = r#"set -e
for f in $(find workdir -name '*.yaml' | sort); do
  name=$(basename "$f" .yaml)
  mkdir -p "generated/$name"
  datamodel-codegen --input "$f" --input-file-type openapi --output-model-type pydantic_v2.BaseModel --use-annotated --output "generated/$name"
done"#;
const GENERATED_FOLDER: &str = "generated";
const SORTED_FOLDER: &str = "sorted";
const MODELS_FOLDER: &str = "models";

/// Configuration for Python generation.
#[derive(Debug, Clone)]
pub struct PythonConfig {
    /// Image carrying the model generator.
    pub image: String,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            image: DEFAULT_PYTHON_IMAGE.to_string(),
        }
    }
}

impl PythonConfig {
    /// Sets the generator image.
    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }
}

/// Reverses the dot-separated labels of an API group.
pub fn reverse_group(group: &str) -> String {
    let mut labels: Vec<&str> = group.split('.').collect();
    labels.reverse();
    labels.join(".")
}

/// Builds the OpenAPI documents handed to the generator.
///
/// Each document is written as `<group with underscores>_<version>_<kind>.yaml`.
pub fn stage_documents(fs: &dyn FileSystem, exclude: &[String]) -> PythonResult<VirtualFileTree> {
    let mut staged = VirtualFileTree::new();
    for crd in collect_crds(fs, exclude)? {
        let group = &crd.crd.spec.group;
        let kind = &crd.crd.spec.names.kind;
        for (version, mut doc) in extract_openapi(&crd.crd)? {
            let prefix = format!("{}.{}.", group, version);
            let reversed = format!("{}.{}.", reverse_group(group), version);
            let names: Vec<String> = doc
                .schemas()
                .keys()
                .filter(|name| !is_meta_v1(name))
                .cloned()
                .collect();
            for name in names {
                if let Some(rest) = name.strip_prefix(&prefix) {
                    doc.rename_component(&name, &format!("{}{}", reversed, rest));
                }
            }
            // Models only; path items still point at the old names.
            doc.paths.clear();

            let file = format!(
                "{}_{}_{}.yaml",
                group.replace('.', "_"),
                version,
                kind.to_lowercase()
            );
            let yaml = doc
                .to_yaml()
                .map_err(|e| SpecError::serialize_failed(&file, e))?;
            staged.write(&file, yaml.as_bytes())?;
        }
    }
    Ok(staged)
}

/// Generates Python models for every definition in `fs`.
///
/// Returns `None` without starting a container when the tree holds no CRDs
/// or XRDs.
pub async fn generate(
    fs: &dyn FileSystem,
    exclude: &[String],
    runner: &dyn SchemaRunner,
    config: &PythonConfig,
) -> PythonResult<Option<VirtualFileTree>> {
    let mut work = stage_documents(fs, exclude)?;
    if work.is_empty() {
        tracing::debug!("no definitions found, skipping Python generation");
        return Ok(None);
    }

    let request =
        SandboxRequest::new(&config.image, ["sh", "-c", GENERATE_SCRIPT]).base_folder(BASE_FOLDER);
    tracing::info!(image = %config.image, documents = work.len(), "generating Python models");
    runner.generate(&mut work, &request).await?;

    restructure::transform_structure(&mut work, GENERATED_FOLDER, SORTED_FOLDER)?;

    let mut out = VirtualFileTree::new();
    let files = copy_dir(&work, SORTED_FOLDER, &mut out, MODELS_FOLDER)?;
    tracing::info!(files, "generated Python models");
    Ok(Some(out))
}
