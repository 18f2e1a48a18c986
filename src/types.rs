//! Common types used throughout the loader
//!
//! Date ranges, windows and table references shared by the enricher,
//! the provisioner and the chunked loader.

use crate::error::{Error, Result};
use chrono::{Days, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Plain SQL identifier accepted for schema and table names
static IDENTIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

// ============================================================================
// Dates
// ============================================================================

/// Inclusive range of Gregorian dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `start > end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::invalid_value(
                "date_range",
                format!("start date {start} is after end date {end}"),
            ));
        }
        Ok(Self { start, end })
    }

    /// Parse both bounds with [`parse_date`]
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_date("start_date", start)?, parse_date("end_date", end)?)
    }

    /// Number of days in the range, both ends included
    pub fn len_days(&self) -> u64 {
        (self.end - self.start).num_days() as u64 + 1
    }

    /// Iterate over every day in the range in ascending order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

/// A contiguous slice of a [`DateRange`] processed as one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Number of days in the window, both ends included
    pub fn len_days(&self) -> u64 {
        (self.end - self.start).num_days() as u64 + 1
    }

    /// First day after this window
    pub fn next_start(&self) -> Option<NaiveDate> {
        self.end.checked_add_days(Days::new(1))
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

/// Parse a date given as `YYYY-MM-DD` or `YYYY/MM/DD`
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    ["%Y-%m-%d", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .ok_or_else(|| Error::invalid_value(field, format!("'{value}' is not a valid date")))
}

// ============================================================================
// Tables
// ============================================================================

/// Schema-qualified table name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl TableRef {
    /// Create a table reference, validating both identifiers
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Result<Self> {
        let table_ref = Self {
            schema: schema.into(),
            table: table.into(),
        };
        table_ref.validate()?;
        Ok(table_ref)
    }

    /// Check that schema and table are plain identifiers
    ///
    /// Names are substituted into SQL templates verbatim, so anything beyond
    /// `[A-Za-z_][A-Za-z0-9_]*` is rejected.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("schema", &self.schema), ("table", &self.table)] {
            if !IDENTIFIER_REGEX.is_match(value) {
                return Err(Error::invalid_value(
                    field,
                    format!("'{value}' is not a valid SQL identifier"),
                ));
            }
        }
        Ok(())
    }

    /// Double-quoted `"schema"."table"` form
    pub fn quoted(&self) -> String {
        format!(
            "{}.{}",
            quote_identifier(&self.schema),
            quote_identifier(&self.table)
        )
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// Source (staging) and target tables for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePair {
    pub source: TableRef,
    pub target: TableRef,
}

impl TablePair {
    pub fn validate(&self) -> Result<()> {
        self.source.validate()?;
        self.target.validate()?;
        if self.source == self.target {
            return Err(Error::config(format!(
                "source and target must be different tables, both are '{}'",
                self.source
            )));
        }
        Ok(())
    }
}

/// Quote an identifier for SQL, doubling embedded quotes
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
