//! Generate command implementation
//!
//! Generates KCL, Python, Go and JSON Schema models for every CRD and XRD in
//! a project and registers them in the model cache.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use colored::Colorize;
use crossgen_runner::DockerRunner;
use crossgen_spec::Language;
use crossgen_vfs::VirtualFileTree;
use serde::Serialize;

use super::{canonical_project, print_json, runtime, GlobalOptions, JsonError};
use crate::generate::{generate_models, GenerateSummary};
use crate::registry::CacheRegistry;

#[derive(Debug, Serialize)]
struct GenerateOutput {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_dir: Option<String>,
    files: BTreeMap<Language, usize>,
    duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonError>,
}

/// Run the generate command
///
/// # Arguments
/// * `project` - Project root holding the definitions
/// * `exclude` - Extra source paths to skip
/// * `options` - Config file and global overrides
/// * `json_output` - Whether to output machine-readable JSON
///
/// # Returns
/// Exit code: 0 success, 1 generation error
pub fn run(
    project: &str,
    exclude: &[String],
    options: &GlobalOptions,
    json_output: bool,
) -> Result<ExitCode> {
    let start = Instant::now();
    let root = canonical_project(project)?;
    let config = options.resolve()?;
    let cache_root = config.cache_root(&root);

    let mut generate_config = config.generate_config();
    generate_config.exclude.extend(exclude.iter().cloned());
    if let Ok(relative) = cache_root.strip_prefix(&root) {
        generate_config
            .exclude
            .push(relative.to_string_lossy().replace('\\', "/"));
    }

    if !json_output {
        println!("{} {}", "Generating models from:".cyan().bold(), root.display());
        println!("{} {}", "Model cache:".cyan().bold(), cache_root.display());
    }

    let source = VirtualFileTree::load_dir(&root)
        .with_context(|| format!("Failed to load project: {}", root.display()))?;
    let runner = DockerRunner::with_config(config.runner_config())
        .context("Failed to set up sandbox runner")?;
    let mut registry = CacheRegistry::new(&cache_root);

    let rt = runtime()?;
    let result = rt.block_on(generate_models(
        Arc::new(source),
        &runner,
        &mut registry,
        &generate_config,
    ));
    let duration_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(summary) => {
            if json_output {
                print_json(&GenerateOutput {
                    success: true,
                    cache_dir: Some(cache_root.display().to_string()),
                    files: summary.files,
                    duration_ms,
                    error: None,
                })?;
            } else {
                print_summary(&summary, &cache_root, duration_ms);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if json_output => {
            print_json(&GenerateOutput {
                success: false,
                cache_dir: None,
                files: BTreeMap::new(),
                duration_ms,
                error: Some(JsonError::from_backend(&e)),
            })?;
            Ok(ExitCode::from(1))
        }
        Err(e) => Err(e).context("Model generation failed"),
    }
}

fn print_summary(summary: &GenerateSummary, cache_root: &Path, duration_ms: u64) {
    println!();
    if summary.is_empty() {
        println!(
            "  {} {}",
            "!!".yellow(),
            "No CRDs or XRDs found; nothing was generated".dimmed()
        );
        return;
    }
    for (language, files) in &summary.files {
        println!(
            "  {} {:<7} {} files -> {}",
            "ok".green(),
            language.as_str(),
            files,
            cache_root.join(language.as_str()).display()
        );
    }
    println!();
    println!("{} Models generated in {}ms", "SUCCESS".green().bold(), duration_ms);
}
