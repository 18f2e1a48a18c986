//! Table provisioning
//!
//! Runs the operator's DDL templates once per run before any window is
//! loaded. Existence is never checked here: `create_table` and
//! `create_target_table_index` must be safe to re-run on their own
//! (`IF NOT EXISTS`).

use crate::error::Result;
use crate::queries::QueryTemplateSet;
use crate::store::RelationalStore;
use crate::types::{TablePair, TableRef};
use std::sync::Arc;
use tracing::info;

/// Issues the create-table and create-index templates
#[derive(Clone)]
pub struct TableProvisioner {
    store: Arc<dyn RelationalStore>,
    queries: Arc<QueryTemplateSet>,
}

impl TableProvisioner {
    pub fn new(store: Arc<dyn RelationalStore>, queries: Arc<QueryTemplateSet>) -> Self {
        Self { store, queries }
    }

    /// Run `create_table` for the source, then the target
    pub async fn ensure_tables(&self, tables: &TablePair) -> Result<()> {
        for table in [&tables.source, &tables.target] {
            let sql = self.queries.create_table(table)?;
            self.store.execute(&sql).await?;
            info!(table = %table, "Table is ready");
        }
        Ok(())
    }

    /// Run `create_target_table_index` against the target only
    pub async fn ensure_index(&self, target: &TableRef) -> Result<()> {
        let sql = self.queries.create_target_index(target)?;
        self.store.execute(&sql).await?;
        info!(table = %target, "Target index is ready");
        Ok(())
    }
}
