//! CLI arguments

use clap::Parser;
use std::path::PathBuf;

/// Load Jalali calendar rows for a date range into a warehouse table
#[derive(Parser, Debug)]
#[command(name = "jalali-calendar-loader")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run configuration file (YAML); read from the environment when omitted
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Query templates file (YAML)
    #[arg(short, long, default_value = "config/queries.yaml")]
    pub queries: PathBuf,

    /// Output format of the final report
    #[arg(short, long, default_value = "json")]
    pub format: OutputFormat,

    /// Validate configuration and templates, print the planned windows and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one line)
    Json,
    /// Indented JSON
    Pretty,
}
