//! In-memory store that records every call, for unit tests

use super::{RelationalStore, RowBatch, RowSet};
use crate::error::{Error, Result};
use crate::types::TableRef;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StoreCall {
    Execute(String),
    Append {
        table: String,
        rows: usize,
        first: Option<NaiveDate>,
        last: Option<NaiveDate>,
    },
}

#[derive(Debug, Default)]
pub(crate) struct RecordingStore {
    calls: Mutex<Vec<StoreCall>>,
    fail_execute_containing: Option<String>,
    fail_append: bool,
}

impl RecordingStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fail any `execute` whose SQL contains `needle`
    pub(crate) fn failing_execute(needle: &str) -> Self {
        Self {
            fail_execute_containing: Some(needle.to_string()),
            ..Self::default()
        }
    }

    pub(crate) fn failing_append() -> Self {
        Self {
            fail_append: true,
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn executed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                StoreCall::Execute(sql) => Some(sql),
                StoreCall::Append { .. } => None,
            })
            .collect()
    }
}

#[async_trait]
impl RelationalStore for RecordingStore {
    async fn execute(&self, sql: &str) -> Result<RowSet> {
        self.calls
            .lock()
            .unwrap()
            .push(StoreCall::Execute(sql.to_string()));
        if let Some(needle) = &self.fail_execute_containing {
            if sql.contains(needle.as_str()) {
                return Err(Error::query("execute", format!("refused: {needle}")));
            }
        }
        Ok(RowSet::empty())
    }

    async fn bulk_append(&self, table: &TableRef, batch: &RowBatch) -> Result<u64> {
        let dates: Vec<_> = batch
            .rows()
            .iter()
            .filter_map(|row| row.first().and_then(super::SqlValue::as_date))
            .collect();
        self.calls.lock().unwrap().push(StoreCall::Append {
            table: table.to_string(),
            rows: batch.len(),
            first: dates.first().copied(),
            last: dates.last().copied(),
        });
        if self.fail_append {
            return Err(Error::write(table.to_string(), "connection reset"));
        }
        Ok(batch.len() as u64)
    }

    fn backend(&self) -> &'static str {
        "recording"
    }
}
