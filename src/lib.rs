// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # Jalali calendar loader
//!
//! Builds a Jalali (Solar Hijri) date dimension for a Gregorian date range
//! and loads it into a warehouse table, one window of days at a time.
//!
//! ## Features
//!
//! - **Calendar enrichment**: Jalali year, month, day, weekday, week and
//!   quarter with Persian names for every Gregorian day
//! - **Holiday lookup**: per-day holiday flag and event descriptions from
//!   holidayapi.ir, with timeout and optional rate limiting
//! - **Chunked load**: append to staging, merge into target, truncate staging,
//!   window after window
//! - **Operator SQL**: table, index, merge and truncate statements come from a
//!   YAML template file
//! - **Two stores**: PostgreSQL (`sqlx`) and DuckDB
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jalali_calendar_loader::{config::RunConfig, pipeline::Driver, queries::QueryTemplateSet};
//!
//! #[tokio::main]
//! async fn main() -> jalali_calendar_loader::Result<()> {
//!     let config = RunConfig::from_env()?;
//!     let queries = QueryTemplateSet::from_file("config/queries.yaml")?;
//!     let report = Driver::new(config, queries).run().await?;
//!     println!("loaded {} rows", report.rows_loaded);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           Driver                             │
//! │   ensure_tables → ensure_index → reset_staging → process     │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────┬───────────────┴──┬──────────────┬──────────────┐
//! │  Calendar   │     Holiday      │   Loader     │    Store     │
//! ├─────────────┼──────────────────┼──────────────┼──────────────┤
//! │ icu Persian │ HTTP + governor  │ Windows      │ PostgreSQL   │
//! │ Names       │ Timeout          │ Stage        │ DuckDB       │
//! │ Week, qtr   │                  │ Merge        │              │
//! │             │                  │ Truncate     │              │
//! └─────────────┴──────────────────┴──────────────┴──────────────┘
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the loader
pub mod error;

/// Date ranges, windows and table references
pub mod types;

/// Placeholder substitution for SQL templates
pub mod template;

/// Operator-supplied SQL templates
pub mod queries;

/// Run configuration
pub mod config;

/// HTTP client with retry and rate limiting
pub mod http;

/// Holiday lookup
pub mod holiday;

/// Jalali conversion and row enrichment
pub mod calendar;

/// Relational store backends
pub mod store;

/// Table provisioning
pub mod provision;

/// Windowed enrich, stage, merge and truncate
pub mod loader;

/// Run driver
pub mod pipeline;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, ErrorKind, Result};
pub use types::*;

pub use calendar::{CalendarEnricher, CalendarRow};
pub use config::RunConfig;
pub use loader::{ChunkedLoader, LoadReport};
pub use pipeline::Driver;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
