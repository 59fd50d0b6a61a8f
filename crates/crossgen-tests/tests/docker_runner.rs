//! Sandbox Tests against a real Docker daemon
//!
//! Tests verify:
//! - A tree survives a container round trip unchanged
//! - Oversized container output is truncated at the configured cap
//! - Failing jobs report their exit code and logs
//!
//! ## Running Tests
//!
//! ```bash
//! CROSSGEN_RUN_DOCKER_TESTS=1 cargo test -p crossgen-tests --test docker_runner -- --ignored
//! ```

use crossgen_runner::{DockerRunner, RunnerConfig, RunnerError, SandboxRequest, SchemaRunner};
use crossgen_tests::harness::{is_docker_available, should_run_docker_tests};
use crossgen_vfs::{FileSystem, VirtualFileTree};
use pretty_assertions::assert_eq;

const IMAGE: &str = "docker.io/library/busybox:1.36";

fn docker_enabled() -> bool {
    if !should_run_docker_tests() {
        println!("Docker tests not enabled, skipping");
        return false;
    }
    if !is_docker_available() {
        println!("Docker not available, skipping");
        return false;
    }
    true
}

#[tokio::test]
#[ignore] // Run with CROSSGEN_RUN_DOCKER_TESTS=1
async fn test_round_trip_identity() {
    if !docker_enabled() {
        return;
    }

    let original = VirtualFileTree::from_files([
        ("crds/widget.yaml", "kind: CustomResourceDefinition\n"),
        ("nested/deeper/data.bin", "\u{0}\u{1}\u{2}binary"),
        ("README.md", "# readme\n"),
    ])
    .unwrap();
    let mut fs = original.clone();

    let runner = DockerRunner::new().unwrap();
    runner
        .generate(&mut fs, &SandboxRequest::new(IMAGE, ["true"]))
        .await
        .unwrap();

    assert_eq!(fs.paths(), original.paths());
    for file in original.paths() {
        assert_eq!(fs.read(&file).unwrap(), original.read(&file).unwrap(), "{file}");
    }
}

#[tokio::test]
#[ignore] // Run with CROSSGEN_RUN_DOCKER_TESTS=1
async fn test_output_truncated_at_cap() {
    if !docker_enabled() {
        return;
    }

    let runner = DockerRunner::with_config(RunnerConfig::default().max_file_size(1024)).unwrap();
    let mut fs = VirtualFileTree::new();
    let request = SandboxRequest::new(IMAGE, ["sh", "-c", "head -c 65536 /dev/zero > big.bin"]);
    runner.generate(&mut fs, &request).await.unwrap();

    assert_eq!(fs.read("big.bin").unwrap().len(), 1024);
}

#[tokio::test]
#[ignore] // Run with CROSSGEN_RUN_DOCKER_TESTS=1
async fn test_non_zero_exit_reports_logs() {
    if !docker_enabled() {
        return;
    }

    let runner = DockerRunner::new().unwrap();
    let mut fs = VirtualFileTree::new();
    let request = SandboxRequest::new(IMAGE, ["sh", "-c", "echo broken import >&2; exit 3"]);
    let err = runner.generate(&mut fs, &request).await.unwrap_err();
    match err {
        RunnerError::NonZeroExit { exit_code, logs } => {
            assert_eq!(exit_code, 3);
            assert!(logs.contains("broken import"), "{logs}");
        }
        other => panic!("expected non-zero exit, got {other}"),
    }
}

#[tokio::test]
#[ignore] // Run with CROSSGEN_RUN_DOCKER_TESTS=1
async fn test_no_sandbox_containers_left_behind() {
    if !docker_enabled() {
        return;
    }

    // A label of its own keeps concurrent tests out of the sweep.
    let config = RunnerConfig::default().label("dev.crossgen.sandbox-reap-test=true");
    let runner = DockerRunner::with_config(config).unwrap();
    let mut fs = VirtualFileTree::from_files([("a.txt", "a")]).unwrap();
    runner
        .generate(&mut fs, &SandboxRequest::new(IMAGE, ["true"]))
        .await
        .unwrap();

    assert_eq!(runner.reap_orphans().await.unwrap(), 0);
}
