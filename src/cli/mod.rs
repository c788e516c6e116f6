//! CLI layer for healthmate-rs.
//!
//! Provides the command-line interface using clap, with commands for
//! asking questions, vetting claims, analyzing reports, aftercare
//! support, and direct tool invocation.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands};
