//! CLI module
//!
//! Thin command-line wrapper around [`crate::pipeline::Driver`]: load the
//! run configuration and query templates, run, print the report.

mod commands;
mod runner;

pub use commands::{Cli, OutputFormat};
pub use runner::Runner;
