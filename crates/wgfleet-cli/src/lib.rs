//! Library surface backing the `wgfleet` binary: argument parsing, backend
//! resolution, and per-subcommand command logic.

pub mod backend;
pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::Cli;
pub use error::{CliError, Result};
