//! Relational store
//!
//! The pipeline only needs two things from a database: run a piece of SQL and
//! append a batch of rows to a table. [`RelationalStore`] captures that
//! contract; [`PostgresStore`] and [`DuckDbStore`] implement it.
//!
//! Both backends open a fresh connection for every call and close it before
//! returning. There is no pooling.

mod duckdb_store;
mod postgres_store;

pub use duckdb_store::DuckDbStore;
pub use postgres_store::PostgresStore;

use crate::error::{Error, Result};
use crate::types::TableRef;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Values
// ============================================================================

/// A single SQL value moving in or out of a store
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    Text(String),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Dates come back as [`SqlValue::Date`] or as ISO text depending on the
    /// backend; both are accepted here.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            SqlValue::Date(d) => Some(*d),
            SqlValue::Text(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").ok(),
            _ => None,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Bool(b) => write!(f, "{b}"),
            SqlValue::Int(i) => write!(f, "{i}"),
            SqlValue::Float(v) => write!(f, "{v}"),
            SqlValue::Date(d) => write!(f, "{d}"),
            SqlValue::Text(s) => f.write_str(s),
        }
    }
}

// ============================================================================
// Result sets and batches
// ============================================================================

/// Rows returned by [`RelationalStore::execute`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl RowSet {
    /// Result of a statement that returns no rows
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value of column `name` in row `row`
    pub fn get(&self, row: usize, name: &str) -> Option<&SqlValue> {
        let idx = self.column_index(name)?;
        self.rows.get(row)?.get(idx)
    }

    /// First column of the first row, for `SELECT count(*)` style queries
    pub fn scalar(&self) -> Option<&SqlValue> {
        self.rows.first()?.first()
    }
}

/// Column type of a [`RowBatch`], used to bind typed NULLs and dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Boolean,
    Integer,
    Text,
    Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Rows to append, all shaped like `columns`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowBatch {
    columns: Vec<Column>,
    rows: Vec<Vec<SqlValue>>,
}

impl RowBatch {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a batch without checking row widths; [`RowBatch::validate`]
    /// runs before any write.
    pub fn from_parts(columns: Vec<Column>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self { columns, rows }
    }

    /// Add a row, rejecting one whose width does not match the columns
    pub fn push(&mut self, row: Vec<SqlValue>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::invalid_value(
                "row",
                format!(
                    "expected {} values, got {}",
                    self.columns.len(),
                    row.len()
                ),
            ));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<SqlValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check the batch can be written to `table`
    pub fn validate(&self, table: &TableRef) -> Result<()> {
        if self.columns.is_empty() {
            return Err(Error::write(table.to_string(), "batch has no columns"));
        }
        if let Some((i, row)) = self
            .rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != self.columns.len())
        {
            return Err(Error::write(
                table.to_string(),
                format!(
                    "row {i} has {} values but the batch has {} columns",
                    row.len(),
                    self.columns.len()
                ),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Store contract
// ============================================================================

/// SQL-executing collaborator
///
/// `execute` commits before it returns and reports failures as
/// [`Error::Query`]. `bulk_append` writes the whole batch in one transaction
/// and reports failures as [`Error::Write`]; a failed append leaves no rows
/// behind.
#[async_trait]
pub trait RelationalStore: Send + Sync {
    /// Run arbitrary SQL, returning the rows of a row-producing statement
    async fn execute(&self, sql: &str) -> Result<RowSet>;

    /// Append `batch` to `table`, returning the number of rows written
    async fn bulk_append(&self, table: &TableRef, batch: &RowBatch) -> Result<u64>;

    /// Short backend name for logs
    fn backend(&self) -> &'static str;
}

/// Whether the statement produces a result set
///
/// Looks at the first keyword after any leading comments, and treats DML
/// with a `RETURNING` clause as row-producing.
pub(crate) fn returns_rows(sql: &str) -> bool {
    let body = strip_leading_comments(sql);
    let first = body
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();

    match first.as_str() {
        "SELECT" | "WITH" | "VALUES" | "SHOW" | "DESCRIBE" | "PRAGMA" | "TABLE" | "EXPLAIN" => {
            true
        }
        "INSERT" | "UPDATE" | "DELETE" => body
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .any(|word| word.eq_ignore_ascii_case("RETURNING")),
        _ => false,
    }
}

/// Drop whitespace, `-- ...` line comments and `/* ... */` block comments
/// in front of the first statement keyword
fn strip_leading_comments(sql: &str) -> &str {
    let mut rest = sql.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix("--") {
            rest = after.find('\n').map_or("", |i| &after[i + 1..]).trim_start();
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.find("*/").map_or("", |i| &after[i + 2..]).trim_start();
        } else {
            return rest;
        }
    }
}

/// Comma-separated, quoted column list of a batch
pub(crate) fn column_list(batch: &RowBatch) -> String {
    batch
        .columns()
        .iter()
        .map(|c| crate::types::quote_identifier(&c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod tests;
