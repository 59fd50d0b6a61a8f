//! Crossgen CLI - Command-line interface for Crossplane model generation
//!
//! This binary provides commands for generating language models from CRDs
//! and XRDs, and for building and scaffolding composition tests.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crossgen_cli::commands::{self, GlobalOptions};
use crossgen_cli::logging;
use crossgen_cli::testing::TestLanguage;

/// Crossgen - Models and tests for Crossplane projects
#[derive(Parser)]
#[command(name = "crossgen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable debug logging (overridden by CROSSGEN_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Timeout for each sandbox container, in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Model cache directory (default: <project>/.crossgen)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate KCL, Python, Go and JSON Schema models for a project
    Generate {
        /// Project root holding CRDs and XRDs
        #[arg(default_value = ".")]
        project: String,

        /// Source paths to skip (repeatable)
        #[arg(short, long)]
        exclude: Vec<String>,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Build or scaffold composition tests
    Test {
        #[command(subcommand)]
        command: TestCommands,
    },

    /// Check the container runtime and generator images
    Doctor {
        /// Remove sandbox containers left behind by killed runs
        #[arg(long)]
        reap: bool,
    },
}

#[derive(Subcommand)]
enum TestCommands {
    /// Render test directories and print the test cases they declare
    Build {
        /// Glob patterns selecting test directories (default: the tests folder)
        patterns: Vec<String>,

        /// Project root
        #[arg(short, long, default_value = ".")]
        project: String,

        /// Tests folder relative to the project
        #[arg(long, default_value = "tests")]
        tests_folder: String,

        /// Build end-to-end tests (e2etest-*) instead of composition tests
        #[arg(long)]
        e2e: bool,

        /// Fail on rendered items that are not test cases
        #[arg(long)]
        strict: bool,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Scaffold a new test from the embedded templates
    Generate {
        /// Test name (prefixed with test- or e2etest-)
        name: String,

        /// Language of the test
        #[arg(short, long, default_value = "kcl")]
        language: TestLanguage,

        /// Scaffold an end-to-end test
        #[arg(long)]
        e2e: bool,

        /// Overwrite a non-empty test directory
        #[arg(short, long)]
        force: bool,

        /// Project root
        #[arg(short, long, default_value = ".")]
        project: String,

        /// Tests folder relative to the project
        #[arg(long, default_value = "tests")]
        tests_folder: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let options = GlobalOptions {
        config: cli.config,
        timeout_secs: cli.timeout_secs,
        cache_dir: cli.cache_dir,
    };

    let result = match cli.command {
        Commands::Generate {
            project,
            exclude,
            json,
        } => commands::generate::run(&project, &exclude, &options, json),
        Commands::Test { command } => match command {
            TestCommands::Build {
                patterns,
                project,
                tests_folder,
                e2e,
                strict,
                json,
            } => {
                let args = commands::test_build::TestBuildArgs {
                    project,
                    patterns,
                    tests_folder,
                    e2e,
                    strict,
                };
                commands::test_build::run(&args, &options, json)
            }
            TestCommands::Generate {
                name,
                language,
                e2e,
                force,
                project,
                tests_folder,
            } => {
                let args = commands::test_generate::TestGenerateArgs {
                    project,
                    tests_folder,
                    name,
                    language,
                    e2e,
                    force,
                };
                commands::test_generate::run(&args, &options)
            }
        },
        Commands::Doctor { reap } => commands::doctor::run(reap, &options),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_generate_defaults() {
        let cli = Cli::try_parse_from(["crossgen", "generate"]).unwrap();
        assert!(!cli.verbose);
        match cli.command {
            Commands::Generate {
                project,
                exclude,
                json,
            } => {
                assert_eq!(project, ".");
                assert!(exclude.is_empty());
                assert!(!json);
            }
            _ => panic!("expected generate command"),
        }
    }

    #[test]
    fn test_cli_parses_generate_with_excludes() {
        let cli = Cli::try_parse_from([
            "crossgen",
            "generate",
            "./platform",
            "--exclude",
            "vendor",
            "-e",
            "examples",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate {
                project,
                exclude,
                json,
            } => {
                assert_eq!(project, "./platform");
                assert_eq!(exclude, vec!["vendor", "examples"]);
                assert!(json);
            }
            _ => panic!("expected generate command"),
        }
    }

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "crossgen",
            "doctor",
            "--verbose",
            "--timeout-secs",
            "30",
            "--cache-dir",
            "/tmp/models",
            "--config",
            "crossgen.json",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.timeout_secs, Some(30));
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/models")));
        assert_eq!(cli.config, Some(PathBuf::from("crossgen.json")));
        match cli.command {
            Commands::Doctor { reap } => assert!(!reap),
            _ => panic!("expected doctor command"),
        }
    }

    #[test]
    fn test_cli_parses_test_build() {
        let cli = Cli::try_parse_from([
            "crossgen",
            "test",
            "build",
            "tests/test-*",
            "tests/e2etest-*",
            "--e2e",
            "--strict",
        ])
        .unwrap();
        match cli.command {
            Commands::Test {
                command:
                    TestCommands::Build {
                        patterns,
                        project,
                        tests_folder,
                        e2e,
                        strict,
                        json,
                    },
            } => {
                assert_eq!(patterns, vec!["tests/test-*", "tests/e2etest-*"]);
                assert_eq!(project, ".");
                assert_eq!(tests_folder, "tests");
                assert!(e2e);
                assert!(strict);
                assert!(!json);
            }
            _ => panic!("expected test build command"),
        }
    }

    #[test]
    fn test_cli_parses_test_generate() {
        let cli = Cli::try_parse_from([
            "crossgen",
            "test",
            "generate",
            "network",
            "--language",
            "python",
            "--force",
        ])
        .unwrap();
        match cli.command {
            Commands::Test {
                command:
                    TestCommands::Generate {
                        name,
                        language,
                        e2e,
                        force,
                        ..
                    },
            } => {
                assert_eq!(name, "network");
                assert_eq!(language, TestLanguage::Python);
                assert!(!e2e);
                assert!(force);
            }
            _ => panic!("expected test generate command"),
        }
    }

    #[test]
    fn test_cli_test_generate_defaults_to_kcl() {
        let cli = Cli::try_parse_from(["crossgen", "test", "generate", "network"]).unwrap();
        match cli.command {
            Commands::Test {
                command: TestCommands::Generate { language, .. },
            } => assert_eq!(language, TestLanguage::Kcl),
            _ => panic!("expected test generate command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_language() {
        let result = Cli::try_parse_from(["crossgen", "test", "generate", "x", "--language", "go"]);
        assert!(result.is_err());
    }
}
