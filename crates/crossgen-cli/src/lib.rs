//! crossgen CLI library.
//!
//! This crate wires the backends together: the generation orchestrator, the
//! model registry, the test builder, test scaffolding, and the command
//! implementations used by the `crossgen` binary.

pub mod config;
pub mod generate;
pub mod logging;
pub mod meta_schemas;
pub mod registry;
pub mod scaffold;
pub mod testing;

pub mod commands;
