//! Chunked loader
//!
//! Drives one run over a date range, one window at a time.
//!
//! # Overview
//!
//! Each window goes through the same four stages, strictly in order:
//!
//! 1. **Enriching** - build a [`CalendarRow`] for every day of the window
//! 2. **Staging** - bulk append those rows to the source (staging) table
//! 3. **Merging** - run `merge_source_into_target`
//! 4. **Truncating** - run `truncate_source_table`
//!
//! Windows never overlap and are never interleaved. The first failure aborts
//! the run; the error names the window and the stage it failed in, and the
//! staging table is left as it was at that point.

mod window;

pub use window::{windows, Windows};

use crate::calendar::{CalendarEnricher, CalendarRow};
use crate::error::{Result, Stage};
use crate::queries::QueryTemplateSet;
use crate::store::RelationalStore;
use crate::types::{DateRange, DateWindow, TablePair};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Default number of days per window
pub const DEFAULT_CHUNK_SIZE: u32 = 30;

/// Outcome of a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Windows processed, in order
    pub windows: Vec<DateWindow>,
    /// Rows appended to staging across all windows
    pub rows_loaded: u64,
    /// Wall time of the run in milliseconds
    pub duration_ms: u64,
}

/// Window-by-window enrich, stage, merge and truncate
#[derive(Clone)]
pub struct ChunkedLoader {
    enricher: CalendarEnricher,
    store: Arc<dyn RelationalStore>,
    queries: Arc<QueryTemplateSet>,
    tables: TablePair,
}

impl ChunkedLoader {
    pub fn new(
        enricher: CalendarEnricher,
        store: Arc<dyn RelationalStore>,
        queries: Arc<QueryTemplateSet>,
        tables: TablePair,
    ) -> Self {
        Self {
            enricher,
            store,
            queries,
            tables,
        }
    }

    pub fn tables(&self) -> &TablePair {
        &self.tables
    }

    /// Clear the staging table with the truncate template
    ///
    /// Run once before [`ChunkedLoader::process`] so rows left behind by a
    /// crashed run are not merged again.
    pub async fn reset_staging(&self) -> Result<()> {
        let sql = self.queries.truncate(&self.tables.source)?;
        self.store.execute(&sql).await?;
        info!(table = %self.tables.source, "Cleared staging table");
        Ok(())
    }

    /// Load every day of `range` in windows of `chunk_size` days
    pub async fn process(&self, range: DateRange, chunk_size: u32) -> Result<LoadReport> {
        let started = Instant::now();
        let windows = windows(range, chunk_size)?;

        // templates are rendered once, the table names never change mid-run
        let merge_sql = self.queries.merge(&self.tables.source, &self.tables.target)?;
        let truncate_sql = self.queries.truncate(&self.tables.source)?;

        let mut report = LoadReport::default();
        for window in windows {
            let rows = self.process_window(window, &merge_sql, &truncate_sql).await?;
            report.rows_loaded += rows;
            report.windows.push(window);

            info!(
                start = %window.start,
                end = %window.end,
                rows,
                "Loaded window {} - {}",
                window.start,
                window.end
            );
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            range = %range,
            windows = report.windows.len(),
            rows = report.rows_loaded,
            duration_ms = report.duration_ms,
            "Loaded all data from {} to {}",
            range.start,
            range.end
        );
        Ok(report)
    }

    async fn process_window(
        &self,
        window: DateWindow,
        merge_sql: &str,
        truncate_sql: &str,
    ) -> Result<u64> {
        debug!(%window, stage = %Stage::Enriching, "Window stage");
        let rows = self
            .enricher
            .enrich(window.start, window.end)
            .await
            .map_err(|e| e.in_window(window.start, window.end, Stage::Enriching))?;

        debug!(%window, stage = %Stage::Staging, rows = rows.len(), "Window stage");
        let written = self
            .store
            .bulk_append(&self.tables.source, &CalendarRow::batch(&rows))
            .await
            .map_err(|e| e.in_window(window.start, window.end, Stage::Staging))?;

        debug!(%window, stage = %Stage::Merging, "Window stage");
        self.store
            .execute(merge_sql)
            .await
            .map_err(|e| e.in_window(window.start, window.end, Stage::Merging))?;
        info!(
            %window,
            source_table = %self.tables.source,
            target_table = %self.tables.target,
            "Source merged into target table"
        );

        debug!(%window, stage = %Stage::Truncating, "Window stage");
        self.store
            .execute(truncate_sql)
            .await
            .map_err(|e| e.in_window(window.start, window.end, Stage::Truncating))?;
        info!(%window, "Table {} truncated", self.tables.source);

        Ok(written)
    }
}

impl std::fmt::Debug for ChunkedLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkedLoader")
            .field("backend", &self.store.backend())
            .field("tables", &self.tables)
            .field("enricher", &self.enricher)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
