//! Test build command implementation
//!
//! Renders the selected test directories in the sandbox and prints the test
//! cases they declare.

use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;
use crossgen_runner::DockerRunner;
use crossgen_spec::TestCase;
use crossgen_vfs::VirtualFileTree;
use serde::Serialize;
use serde_json::Value;

use super::{canonical_project, print_json, runtime, GlobalOptions, JsonError};
use crate::testing::TestBuilder;

#[derive(Debug, Serialize)]
struct BuildOutput {
    success: bool,
    tests: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonError>,
}

/// Options of a test build.
#[derive(Debug, Clone)]
pub struct TestBuildArgs {
    /// Project root.
    pub project: String,
    /// Glob patterns relative to the project, e.g. `tests/*`.
    pub patterns: Vec<String>,
    /// Tests folder relative to the project.
    pub tests_folder: String,
    /// Build end-to-end tests instead of composition tests.
    pub e2e: bool,
    /// Fail on rendered items that are not test cases.
    pub strict: bool,
}

/// Run the test build command
///
/// # Returns
/// Exit code: 0 success, 1 build error
pub fn run(
    args: &TestBuildArgs,
    options: &GlobalOptions,
    json_output: bool,
) -> Result<ExitCode> {
    let root = canonical_project(&args.project)?;
    let config = options.resolve()?;
    let mut build_config = config.build_config();
    if args.strict {
        build_config.decode_mode = crossgen_spec::DecodeMode::Strict;
    }

    let tests_dir = root.join(&args.tests_folder);
    let tests = VirtualFileTree::load_dir(&tests_dir)
        .with_context(|| format!("Failed to load tests folder: {}", tests_dir.display()))?;
    let patterns = if args.patterns.is_empty() {
        vec![args.tests_folder.clone()]
    } else {
        args.patterns.clone()
    };
    let prefix = if args.e2e { "e2etest-" } else { "test-" };

    if !json_output {
        println!("{} {}", "Building tests in:".cyan().bold(), tests_dir.display());
    }

    let runner = DockerRunner::with_config(config.runner_config())
        .context("Failed to set up sandbox runner")?;
    let builder = TestBuilder::new(&runner, build_config);
    let rt = runtime()?;
    let result = rt.block_on(builder.build(
        &tests,
        &patterns,
        &args.tests_folder,
        prefix,
        Some(tests_dir.as_path()),
    ));

    match result {
        Ok(cases) => {
            if json_output {
                let tests = cases.iter().map(to_json).collect::<Result<Vec<_>>>()?;
                print_json(&BuildOutput {
                    success: true,
                    tests,
                    error: None,
                })?;
            } else {
                print_cases(&cases);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if json_output => {
            print_json(&BuildOutput {
                success: false,
                tests: Vec::new(),
                error: Some(JsonError::from_backend(&e)),
            })?;
            Ok(ExitCode::from(1))
        }
        Err(e) => Err(e).context("Test build failed"),
    }
}

fn to_json(case: &TestCase) -> Result<Value> {
    let value = match case {
        TestCase::Composition(test) => serde_json::to_value(test.as_ref()),
        TestCase::E2E(test) => serde_json::to_value(test.as_ref()),
    };
    value.context("Failed to serialize test case")
}

fn print_cases(cases: &[TestCase]) {
    println!();
    if cases.is_empty() {
        println!("  {} {}", "!!".yellow(), "No test cases found".dimmed());
        return;
    }
    for case in cases {
        println!("  {} {} {}", "ok".green(), case.kind().dimmed(), case.name());
    }
    println!();
    println!("{} {} test case(s) built", "SUCCESS".green().bold(), cases.len());
}
