//! crossgen End-to-End Test Infrastructure
//!
//! This crate provides integration tests for the flows users rely on:
//!
//! - Generation: definitions -> models for every language
//! - Test building: test directories -> typed test cases
//! - Scaffolding: test name -> test directory linked to the model cache
//! - Sandbox: trees in and out of real containers (requires Docker)
//!
//! ## Running Tests
//!
//! ```bash
//! # Run everything that works without Docker
//! cargo test -p crossgen-tests
//!
//! # Run the container tests (requires Docker)
//! CROSSGEN_RUN_DOCKER_TESTS=1 cargo test -p crossgen-tests -- --ignored
//! ```
//!
//! The KCL and Python generators normally run in containers. The
//! [`harness`] module provides stub runners that write what those images
//! would, so the generation pipeline is exercised in-process.

pub mod fixtures;
pub mod harness;

// Re-export commonly used items
pub use fixtures::ProjectFixture;
pub use harness::{fake_generators, rendering_runner, should_run_docker_tests};
