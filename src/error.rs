//! Error types for the calendar loader
//!
//! Every fallible operation in the crate returns `Result<T, Error>`.
//! The four pipeline failures (`Conversion`, `Lookup`, `Query`, `Write`) carry
//! enough context for an operator to see which date or table was involved;
//! `Window` wraps them with the window that was in progress.

use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

/// The main error type for the calendar loader
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Pipeline Errors
    // ============================================================================
    #[error("Calendar conversion failed for {date}: {message}")]
    Conversion { date: NaiveDate, message: String },

    #[error("Holiday lookup failed for {date}: {message}")]
    Lookup { date: NaiveDate, message: String },

    #[error("Query failed during {operation}: {message}")]
    Query {
        operation: String,
        message: String,
        /// Connection-level failure rather than a problem with the SQL itself
        transient: bool,
    },

    #[error("Bulk append to '{table}' failed: {message}")]
    Write { table: String, message: String },

    #[error("Window {start} - {end} failed while {stage}: {source}")]
    Window {
        start: NaiveDate,
        end: NaiveDate,
        stage: Stage,
        #[source]
        source: Box<Error>,
    },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Template Errors
    // ============================================================================
    #[error("Undefined variable in template: {variable}")]
    UndefinedVariable { variable: String },

    #[error("Query template '{template}' is missing placeholder(s): {placeholders}")]
    MissingPlaceholder {
        template: String,
        placeholders: String,
    },

    #[error("Query template '{template}' uses unknown placeholder(s): {placeholders}")]
    UnexpectedPlaceholder {
        template: String,
        placeholders: String,
    },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },
}

/// Step of a window's lifecycle, used to label window failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Enriching,
    Staging,
    Merging,
    Truncating,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Enriching => "enriching",
            Stage::Staging => "staging",
            Stage::Merging => "merging",
            Stage::Truncating => "truncating",
        };
        f.write_str(label)
    }
}

/// Coarse classification of an [`Error`], seen through any `Window` wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Conversion,
    Lookup,
    Query,
    Write,
    Config,
    Other,
}

impl Error {
    /// Create a conversion error
    pub fn conversion(date: NaiveDate, message: impl Into<String>) -> Self {
        Self::Conversion {
            date,
            message: message.into(),
        }
    }

    /// Create a lookup error
    pub fn lookup(date: NaiveDate, message: impl Into<String>) -> Self {
        Self::Lookup {
            date,
            message: message.into(),
        }
    }

    /// Create a query error for a failure in the SQL itself
    pub fn query(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            operation: operation.into(),
            message: message.into(),
            transient: false,
        }
    }

    /// Create a query error for a connection-level failure
    pub fn query_transient(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            operation: operation.into(),
            message: message.into(),
            transient: true,
        }
    }

    /// Create a write error
    pub fn write(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Write {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Wrap an error with the window it interrupted
    pub fn in_window(self, start: NaiveDate, end: NaiveDate, stage: Stage) -> Self {
        Self::Window {
            start,
            end,
            stage,
            source: Box::new(self),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an undefined variable error
    pub fn undefined_var(variable: impl Into<String>) -> Self {
        Self::UndefinedVariable {
            variable: variable.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Classify this error, looking through `Window` wrappers
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Window { source, .. } => source.kind(),
            Error::Conversion { .. } => ErrorKind::Conversion,
            Error::Lookup { .. } => ErrorKind::Lookup,
            Error::Query { .. } => ErrorKind::Query,
            Error::Write { .. } => ErrorKind::Write,
            Error::Config { .. }
            | Error::MissingConfigField { .. }
            | Error::InvalidConfigValue { .. }
            | Error::YamlParse(_)
            | Error::MissingPlaceholder { .. }
            | Error::UnexpectedPlaceholder { .. } => ErrorKind::Config,
            _ => ErrorKind::Other,
        }
    }

    /// Whether a later re-run has a reasonable chance of succeeding unchanged
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Window { source, .. } => source.is_transient(),
            Error::Query { transient, .. } => *transient,
            Error::Http(_) | Error::Timeout { .. } => true,
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable
pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for the calendar loader
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::lookup(date(2024, 1, 3), "HTTP 500");
        assert_eq!(
            err.to_string(),
            "Holiday lookup failed for 2024-01-03: HTTP 500"
        );

        let err = Error::write("staging.calendar", "column mismatch");
        assert_eq!(
            err.to_string(),
            "Bulk append to 'staging.calendar' failed: column mismatch"
        );
    }

    #[test]
    fn test_window_context() {
        let err = Error::query("merge", "syntax error").in_window(
            date(2024, 1, 1),
            date(2024, 1, 30),
            Stage::Merging,
        );
        let text = err.to_string();
        assert!(text.contains("2024-01-01 - 2024-01-30"));
        assert!(text.contains("merging"));
        assert!(text.contains("syntax error"));
        assert_eq!(err.kind(), ErrorKind::Query);
    }

    #[test]
    fn test_kind() {
        assert_eq!(
            Error::conversion(date(2024, 1, 1), "x").kind(),
            ErrorKind::Conversion
        );
        assert_eq!(Error::lookup(date(2024, 1, 1), "x").kind(), ErrorKind::Lookup);
        assert_eq!(Error::write("t", "x").kind(), ErrorKind::Write);
        assert_eq!(Error::missing_field("PG_HOST").kind(), ErrorKind::Config);
        assert_eq!(Error::undefined_var("x").kind(), ErrorKind::Other);
    }

    #[test]
    fn test_is_transient() {
        assert!(Error::query_transient("execute", "connection reset").is_transient());
        assert!(!Error::query("execute", "syntax error").is_transient());
        assert!(Error::Timeout { timeout_ms: 5000 }.is_transient());
        assert!(Error::http_status(503, "").is_transient());
        assert!(!Error::http_status(404, "").is_transient());

        let wrapped = Error::query_transient("merge", "closed").in_window(
            date(2024, 1, 1),
            date(2024, 1, 2),
            Stage::Merging,
        );
        assert!(wrapped.is_transient());
    }
}
