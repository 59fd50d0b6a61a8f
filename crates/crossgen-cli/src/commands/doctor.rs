//! Doctor command implementation
//!
//! Checks the container runtime and the generator images.

use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use crossgen_runner::DockerRunner;

use super::{runtime, GlobalOptions};
use crate::config::{user_config_path, ConfigFile};

/// Run the doctor command
///
/// Checks:
/// - Docker daemon reachability
/// - Presence of the generator and test images
/// - Leftover sandbox containers (removed with `reap`)
///
/// # Returns
/// Exit code: 0 if all checks pass, 1 if any fail
pub fn run(reap: bool, options: &GlobalOptions) -> Result<ExitCode> {
    println!("{}", "Crossgen Doctor".cyan().bold());
    println!("{}", "===============".cyan());
    println!();

    let config = options.resolve()?;
    let mut all_ok = true;

    println!("{}", "Versions:".bold());
    println!("  {} crossgen-cli v{}", "->".green(), env!("CARGO_PKG_VERSION"));

    let runner = match DockerRunner::with_config(config.runner_config()) {
        Ok(runner) => runner,
        Err(e) => {
            println!("  {} docker: {}", "!!".red(), e);
            println!(
                "     {}",
                "Docker is required to run the KCL and Python generators.".dimmed()
            );
            println!();
            println!(
                "{} Some checks failed. See above for details.",
                "WARNING".yellow().bold()
            );
            return Ok(ExitCode::from(1));
        }
    };

    let rt = runtime()?;
    match rt.block_on(runner.server_version()) {
        Some(version) => println!("  {} docker server {}", "->".green(), version),
        None => {
            println!("  {} docker server (not reachable)", "!!".red());
            println!("     {}", "Is the Docker daemon running?".dimmed());
            all_ok = false;
        }
    }

    println!();

    println!("{}", "Configuration:".bold());
    match (&options.config, user_config_path()) {
        (Some(path), _) => println!("  {} {}", "->".green(), path.display()),
        (None, Some(path)) if path.is_file() => {
            println!("  {} {}", "->".green(), path.display())
        }
        _ => println!("  {} {}", "->".green(), "defaults".dimmed()),
    }

    println!();

    println!("{}", "Images:".bold());
    if all_ok {
        for (purpose, image) in images_to_check(&config) {
            match rt.block_on(runner.image_present(&image)) {
                Ok(true) => println!("  {} {} {}", "ok".green(), image, purpose.dimmed()),
                Ok(false) => {
                    println!("  {} {} {}", "!!".yellow(), image, purpose.dimmed());
                    println!("     {}", format!("Pull it with: docker pull {}", image).dimmed());
                }
                Err(e) => {
                    println!("  {} {} check failed: {}", "!!".red(), image, e);
                    all_ok = false;
                }
            }
        }
    } else {
        println!("  {} {}", "!!".yellow(), "skipped, docker is not reachable".dimmed());
    }

    if reap && all_ok {
        println!();
        println!("{}", "Containers:".bold());
        match rt.block_on(runner.reap_orphans()) {
            Ok(0) => println!("  {} no orphaned sandbox containers", "ok".green()),
            Ok(count) => println!(
                "  {} removed {} orphaned sandbox container(s)",
                "ok".green(),
                count
            ),
            Err(e) => {
                println!("  {} cleanup failed: {}", "!!".red(), e);
                all_ok = false;
            }
        }
    }

    println!();

    if all_ok {
        println!("{} All checks passed!", "SUCCESS".green().bold());
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "{} Some checks failed. See above for details.",
            "WARNING".yellow().bold()
        );
        Ok(ExitCode::from(1))
    }
}

/// Returns every distinct image the configuration uses, with its purpose.
fn images_to_check(config: &ConfigFile) -> Vec<(String, String)> {
    let generate = config.generate_config();
    let build = config.build_config();
    let candidates = [
        ("kcl models", generate.kcl.image),
        ("python models", generate.python.image),
        ("kcl tests", build.kcl_image),
        ("python tests", build.python_image),
    ];

    let mut images: Vec<(String, String)> = Vec::new();
    for (purpose, image) in candidates {
        match images.iter_mut().find(|(_, existing)| *existing == image) {
            Some((purposes, _)) => {
                purposes.push_str(", ");
                purposes.push_str(purpose);
            }
            None => images.push((purpose.to_string(), image)),
        }
    }
    for (purposes, _) in &mut images {
        *purposes = format!("({})", purposes);
    }
    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::builder::DEFAULT_PYTHON_TEST_IMAGE;
    use crossgen_backend_kcl::DEFAULT_KCL_IMAGE;
    use crossgen_backend_python::DEFAULT_PYTHON_IMAGE;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_images_are_deduplicated() {
        let images = images_to_check(&ConfigFile::default());
        assert_eq!(
            images,
            vec![
                (
                    "(kcl models, kcl tests)".to_string(),
                    DEFAULT_KCL_IMAGE.to_string()
                ),
                ("(python models)".to_string(), DEFAULT_PYTHON_IMAGE.to_string()),
                ("(python tests)".to_string(), DEFAULT_PYTHON_TEST_IMAGE.to_string()),
            ]
        );
    }

    #[test]
    fn test_overridden_images_are_listed() {
        let config = ConfigFile {
            kcl_image: Some("registry.local/kcl:dev".to_string()),
            python_test_image: Some("registry.local/pytest:dev".to_string()),
            ..ConfigFile::default()
        };
        let images: Vec<String> = images_to_check(&config)
            .into_iter()
            .map(|(_, image)| image)
            .collect();
        assert_eq!(
            images,
            vec![
                "registry.local/kcl:dev".to_string(),
                DEFAULT_PYTHON_IMAGE.to_string(),
                "registry.local/pytest:dev".to_string(),
            ]
        );
    }
}
