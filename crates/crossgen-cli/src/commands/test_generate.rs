//! Test generate command implementation
//!
//! Scaffolds a new composition or end-to-end test. The models of the
//! test-case kinds are generated first so that the new test can import them.

use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use crossgen_runner::DockerRunner;
use crossgen_spec::Language;
use crossgen_vfs::VirtualFileTree;

use super::{canonical_project, runtime, GlobalOptions};
use crate::meta_schemas::generate_meta_schemas;
use crate::registry::CacheRegistry;
use crate::scaffold::{
    is_empty_dir, kcl_imports, render_test, validate_dns1035, write_test, EmbeddedAssets,
    ScaffoldRequest,
};
use crate::testing::TestLanguage;

/// Options of a test scaffold.
#[derive(Debug, Clone)]
pub struct TestGenerateArgs {
    /// Project root.
    pub project: String,
    /// Tests folder relative to the project.
    pub tests_folder: String,
    /// Test name without prefix.
    pub name: String,
    pub language: TestLanguage,
    pub e2e: bool,
    /// Overwrite a non-empty test directory.
    pub force: bool,
}

/// Run the test generate command
///
/// # Returns
/// Exit code: 0 success
pub fn run(args: &TestGenerateArgs, options: &GlobalOptions) -> Result<ExitCode> {
    let request = ScaffoldRequest {
        name: args.name.clone(),
        language: args.language,
        e2e: args.e2e,
    };
    let dir_name = request.dir_name();
    if let Err(problems) = validate_dns1035(&dir_name) {
        bail!(
            "'{}' is not a valid test name. DNS-1035 constraints: {}",
            dir_name,
            problems.join("; ")
        );
    }

    let root = canonical_project(&args.project)?;
    let target = root.join(&args.tests_folder).join(&dir_name);
    if !args.force && !is_empty_dir(&target) {
        bail!(
            "The folder '{}' is not empty; pass --force to overwrite its contents",
            target.display()
        );
    }

    let config = options.resolve()?;
    let cache_root = config.cache_root(&root);
    let runner = DockerRunner::with_config(config.runner_config())
        .context("Failed to set up sandbox runner")?;
    let mut registry = CacheRegistry::new(&cache_root);

    println!(
        "{} {}",
        "Generating test-case models in:".cyan().bold(),
        cache_root.display()
    );
    let rt = runtime()?;
    rt.block_on(generate_meta_schemas(
        &runner,
        &mut registry,
        &config.generate_config(),
    ))
    .context("Unable to generate meta API schemas")?;

    let imports = match args.language {
        TestLanguage::Kcl => {
            let kcl_dir = registry.language_dir(Language::Kcl);
            let models = VirtualFileTree::load_dir(&kcl_dir)
                .with_context(|| format!("Failed to read KCL models: {}", kcl_dir.display()))?;
            kcl_imports(&models)
        }
        TestLanguage::Python => Vec::new(),
    };

    let files = render_test(&EmbeddedAssets, &request, &imports)
        .with_context(|| format!("Failed to generate {} test", args.language))?;
    let models_dir = match args.language {
        TestLanguage::Kcl => registry.language_dir(Language::Kcl),
        TestLanguage::Python => registry.language_dir(Language::Python),
    }
    .join("models");
    let written = write_test(&files, &target, &models_dir, args.force)?;

    println!("  {} {} files -> {}", "ok".green(), written, target.display());
    println!();
    println!(
        "{} Successfully created test and saved to {}",
        "SUCCESS".green().bold(),
        target.display()
    );
    Ok(ExitCode::SUCCESS)
}
