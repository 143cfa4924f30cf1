//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. This allows:
//! - Single binary with subcommands (`kable render`, `kable repo add`)
//! - Shared home directory and config loading
//! - Output written through [`Output`] so commands are testable

pub mod completions;
pub mod dispatcher;
pub mod render;
pub mod repo;

pub use dispatcher::{Command, CommandDispatcher, CommandResult, Output};
