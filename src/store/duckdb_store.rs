//! DuckDB-backed store
//!
//! Writes to a local database file. Useful for running the loader without a
//! Postgres server and for end-to-end tests.

use super::{column_list, returns_rows, ColumnType, RelationalStore, RowBatch, RowSet, SqlValue};
use crate::error::{Error, Result};
use crate::types::TableRef;
use async_trait::async_trait;
use duckdb::types::Value;
use duckdb::Connection;
use std::path::{Path, PathBuf};
use tracing::debug;

/// [`RelationalStore`] over a DuckDB database file
#[derive(Debug, Clone)]
pub struct DuckDbStore {
    path: PathBuf,
}

impl DuckDbStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(path: &Path) -> std::result::Result<Connection, duckdb::Error> {
        Connection::open(path)
    }

    /// Statements run on the blocking pool since DuckDB is synchronous
    async fn blocking<T, F>(&self, operation: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> Result<T> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || f(&path))
            .await
            .map_err(|e| Error::query_transient(operation, format!("DuckDB task failed: {e}")))?
    }
}

#[async_trait]
impl RelationalStore for DuckDbStore {
    async fn execute(&self, sql: &str) -> Result<RowSet> {
        let sql = sql.to_string();
        debug!(path = %self.path.display(), "Executing DuckDB statement");

        self.blocking("execute", move |path| {
            let conn = Self::open(path).map_err(|e| {
                Error::query_transient("connect", format!("Failed to open DuckDB database: {e}"))
            })?;

            let statement = sql.trim().trim_end_matches(';').trim();
            if returns_rows(statement) && !statement.contains(';') {
                query_rows(&conn, statement)
            } else {
                conn.execute_batch(&sql)
                    .map_err(|e| Error::query("execute", e.to_string()))?;
                Ok(RowSet::empty())
            }
        })
        .await
    }

    async fn bulk_append(&self, table: &TableRef, batch: &RowBatch) -> Result<u64> {
        batch.validate(table)?;
        if batch.is_empty() {
            return Ok(0);
        }

        let table = table.clone();
        let batch = batch.clone();

        self.blocking("bulk_append", move |path| {
            let write_err = |e: duckdb::Error| Error::write(table.to_string(), e.to_string());

            let mut conn = Self::open(path).map_err(write_err)?;
            let tx = conn.transaction().map_err(write_err)?;

            let placeholders = batch
                .columns()
                .iter()
                .map(|c| match c.column_type {
                    ColumnType::Date => "CAST(? AS DATE)",
                    _ => "?",
                })
                .collect::<Vec<_>>()
                .join(", ");
            let insert_sql = format!(
                "INSERT INTO {} ({}) VALUES ({placeholders})",
                table.quoted(),
                column_list(&batch)
            );

            let mut written = 0u64;
            {
                let mut stmt = tx.prepare(&insert_sql).map_err(write_err)?;
                for row in batch.rows() {
                    let params = row.iter().map(to_duckdb_value);
                    written += stmt
                        .execute(duckdb::params_from_iter(params))
                        .map_err(write_err)? as u64;
                }
            }

            tx.commit().map_err(write_err)?;
            Ok(written)
        })
        .await
    }

    fn backend(&self) -> &'static str {
        "duckdb"
    }
}

fn query_rows(conn: &Connection, sql: &str) -> Result<RowSet> {
    let query_err = |e: duckdb::Error| Error::query("execute", e.to_string());

    let mut stmt = conn.prepare(sql).map_err(query_err)?;
    let mut result = stmt.query([]).map_err(query_err)?;
    // the schema is only known once the statement has run
    let columns = result
        .as_ref()
        .map(|stmt| stmt.column_names())
        .unwrap_or_default();

    let mut rows = Vec::new();
    while let Some(row) = result.next().map_err(query_err)? {
        let values = (0..columns.len())
            .map(|i| row.get::<_, Value>(i).map(from_duckdb_value))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(query_err)?;
        rows.push(values);
    }

    Ok(RowSet { columns, rows })
}

/// Dates are bound as ISO text and cast in the statement
fn to_duckdb_value(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Bool(b) => Value::Boolean(*b),
        SqlValue::Int(i) => Value::BigInt(*i),
        SqlValue::Float(f) => Value::Double(*f),
        SqlValue::Date(d) => Value::Text(d.format("%Y-%m-%d").to_string()),
        SqlValue::Text(s) => Value::Text(s.clone()),
    }
}

fn from_duckdb_value(value: Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Boolean(b) => SqlValue::Bool(b),
        Value::TinyInt(i) => SqlValue::Int(i.into()),
        Value::SmallInt(i) => SqlValue::Int(i.into()),
        Value::Int(i) => SqlValue::Int(i.into()),
        Value::BigInt(i) => SqlValue::Int(i),
        Value::UTinyInt(i) => SqlValue::Int(i.into()),
        Value::USmallInt(i) => SqlValue::Int(i.into()),
        Value::UInt(i) => SqlValue::Int(i.into()),
        Value::UBigInt(i) => {
            i64::try_from(i).map_or_else(|_| SqlValue::Text(i.to_string()), SqlValue::Int)
        }
        Value::HugeInt(i) => {
            i64::try_from(i).map_or_else(|_| SqlValue::Text(i.to_string()), SqlValue::Int)
        }
        Value::Float(f) => SqlValue::Float(f64::from(f)),
        Value::Double(f) => SqlValue::Float(f),
        Value::Text(s) => SqlValue::Text(s),
        Value::Date32(d) => {
            // days since 1970-01-01; 719163 is that day's number from 1 CE
            chrono::NaiveDate::from_num_days_from_ce_opt(d + 719_163)
                .map_or(SqlValue::Int(d.into()), SqlValue::Date)
        }
        other => SqlValue::Text(format!("{other:?}")),
    }
}
