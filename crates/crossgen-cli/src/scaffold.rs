//! Test scaffolding.
//!
//! Creates `tests/test-<name>` (composition tests) or `tests/e2etest-<name>`
//! (end-to-end tests) from templates. Templates come from an
//! [`AssetProvider`]; [`EmbeddedAssets`] serves the ones compiled into the
//! binary.
//!
//! Templates use two placeholders: `{{name}}` for the test directory name and
//! `{{imports}}` for the KCL import block covering every registered model
//! package.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crossgen_vfs::{path, FileSystem, VfsError, VirtualFileTree};
use regex::Regex;
use thiserror::Error;

use crate::testing::TestLanguage;

/// Name of the link from a test directory to the registered models.
pub const MODELS_LINK: &str = "model";

const DNS1035_PATTERN: &str = "^[a-z]([-a-z0-9]*[a-z0-9])?$";
const DNS1035_MAX_LENGTH: usize = 63;

static DNS1035_REGEX: OnceLock<Regex> = OnceLock::new();

fn dns1035_regex() -> &'static Regex {
    DNS1035_REGEX.get_or_init(|| Regex::new(DNS1035_PATTERN).expect("invalid regex pattern"))
}

/// Errors raised while scaffolding a test.
#[derive(Debug, Error)]
pub enum ScaffoldError {
    #[error("'{name}' is not a valid test name. DNS-1035 constraints: {}", .problems.join("; "))]
    InvalidName { name: String, problems: Vec<String> },

    #[error("template {0} not found")]
    MissingTemplate(String),

    #[error("the folder '{}' is not empty; pass --force to overwrite its contents", .0.display())]
    NotEmpty(PathBuf),

    #[error("failed to link {} to {}: {source}", .link.display(), .target.display())]
    Link {
        link: PathBuf,
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Vfs(#[from] VfsError),
}

/// Source of scaffolding templates, keyed by `<language>/<file>`.
pub trait AssetProvider {
    fn template(&self, name: &str) -> Option<Cow<'static, str>>;
}

/// Templates compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedAssets;

impl AssetProvider for EmbeddedAssets {
    fn template(&self, name: &str) -> Option<Cow<'static, str>> {
        let content = match name {
            "kcl/kcl.mod" => include_str!("../assets/kcl/kcl.mod"),
            "kcl/compositiontest.k" => include_str!("../assets/kcl/compositiontest.k"),
            "kcl/e2e.k" => include_str!("../assets/kcl/e2e.k"),
            "python/compositiontest.py" => include_str!("../assets/python/compositiontest.py"),
            "python/e2e.py" => include_str!("../assets/python/e2e.py"),
            "python/requirements.txt" => include_str!("../assets/python/requirements.txt"),
            _ => return None,
        };
        Some(Cow::Borrowed(content))
    }
}

/// Checks `name` against the DNS-1035 label rules, returning every violation.
pub fn validate_dns1035(name: &str) -> Result<(), Vec<String>> {
    let mut problems = Vec::new();
    if name.len() > DNS1035_MAX_LENGTH {
        problems.push(format!("must be no more than {} characters", DNS1035_MAX_LENGTH));
    }
    if !dns1035_regex().is_match(name) {
        problems.push(
            "a DNS-1035 label must consist of lower case alphanumeric characters or '-', \
             start with an alphabetic character, and end with an alphanumeric character"
                .to_string(),
        );
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}

/// Returns the directory name of a test.
pub fn test_dir_name(name: &str, e2e: bool) -> String {
    if e2e {
        format!("e2etest-{}", name)
    } else {
        format!("test-{}", name)
    }
}

/// One KCL import of a registered model package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KclImport {
    /// Dotted module path, e.g. `models.io.crossgen.dev.meta.v1alpha1`.
    pub path: String,
    /// Alias made of the last two path segments, e.g. `metav1alpha1`.
    pub alias: String,
}

/// Lists an import for every directory holding `.k` files in a registered
/// KCL model tree (rooted above `models/`). Aliases that repeat are dropped.
pub fn kcl_imports(models: &dyn FileSystem) -> Vec<KclImport> {
    let mut dirs = BTreeSet::new();
    for file in models.paths() {
        if file.ends_with(".k") && path::strip_dir(&file, "models").is_some() {
            dirs.insert(path::parent(&file).to_string());
        }
    }

    let mut aliases = BTreeSet::new();
    let mut imports = Vec::new();
    for dir in dirs {
        let segments: Vec<&str> = dir.split('/').collect();
        if segments.len() < 2 {
            continue;
        }
        let alias = segments[segments.len() - 2..].concat().replace('-', "_");
        if !aliases.insert(alias.clone()) {
            continue;
        }
        imports.push(KclImport {
            path: segments.join("."),
            alias,
        });
    }
    imports
}

/// What to scaffold.
#[derive(Debug, Clone)]
pub struct ScaffoldRequest {
    /// Test name without the `test-`/`e2etest-` prefix.
    pub name: String,
    pub language: TestLanguage,
    pub e2e: bool,
}

impl ScaffoldRequest {
    pub fn dir_name(&self) -> String {
        test_dir_name(&self.name, self.e2e)
    }
}

/// Renders the files of a new test.
pub fn render_test(
    assets: &dyn AssetProvider,
    request: &ScaffoldRequest,
    imports: &[KclImport],
) -> Result<VirtualFileTree, ScaffoldError> {
    let dir_name = request.dir_name();
    if let Err(problems) = validate_dns1035(&dir_name) {
        return Err(ScaffoldError::InvalidName {
            name: dir_name,
            problems,
        });
    }

    let main = if request.e2e { "e2e" } else { "compositiontest" };
    let files: Vec<(String, String)> = match request.language {
        TestLanguage::Kcl => vec![
            (format!("kcl/{}.k", main), "main.k".to_string()),
            ("kcl/kcl.mod".to_string(), "kcl.mod".to_string()),
        ],
        TestLanguage::Python => vec![
            (format!("python/{}.py", main), "main.py".to_string()),
            ("python/requirements.txt".to_string(), "requirements.txt".to_string()),
        ],
    };

    let import_block: String = imports
        .iter()
        .map(|import| format!("import {} as {}\n", import.path, import.alias))
        .collect();

    let mut tree = VirtualFileTree::new();
    for (template, output) in files {
        let content = assets
            .template(&template)
            .ok_or_else(|| ScaffoldError::MissingTemplate(template.clone()))?;
        let rendered = content
            .replace("{{name}}", &dir_name)
            .replace("{{imports}}", &import_block);
        tree.write(&output, rendered.as_bytes())?;
    }
    Ok(tree)
}

/// Returns true if `dir` is missing or holds nothing.
pub fn is_empty_dir(dir: &Path) -> bool {
    match std::fs::read_dir(dir) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => true,
    }
}

/// Writes a rendered test into `target` and links it to `models_dir`.
///
/// A non-empty `target` is only overwritten when `force` is set.
pub fn write_test(
    files: &VirtualFileTree,
    target: &Path,
    models_dir: &Path,
    force: bool,
) -> Result<usize, ScaffoldError> {
    if !force && !is_empty_dir(target) {
        return Err(ScaffoldError::NotEmpty(target.to_path_buf()));
    }
    let written = files.write_to_dir(target)?;
    link_models(target, models_dir)?;
    Ok(written)
}

#[cfg(unix)]
fn link_models(target: &Path, models_dir: &Path) -> Result<(), ScaffoldError> {
    let link = target.join(MODELS_LINK);
    if link.symlink_metadata().is_ok() {
        std::fs::remove_file(&link).map_err(|source| ScaffoldError::Link {
            link: link.clone(),
            target: models_dir.to_path_buf(),
            source,
        })?;
    }
    std::os::unix::fs::symlink(models_dir, &link).map_err(|source| ScaffoldError::Link {
        link,
        target: models_dir.to_path_buf(),
        source,
    })
}

#[cfg(not(unix))]
fn link_models(target: &Path, models_dir: &Path) -> Result<(), ScaffoldError> {
    tracing::warn!(
        test = %target.display(),
        models = %models_dir.display(),
        "symlinks are not supported on this platform; link the models manually"
    );
    Ok(())
}
