//! Run driver
//!
//! Wires the configured store, holiday API and query templates together and
//! runs one load: provision tables, optionally clear staging, then load the
//! whole range window by window.

use crate::calendar::{CalendarEnricher, PersianCalendar};
use crate::config::{RunConfig, StoreKind};
use crate::error::{Error, Result};
use crate::holiday::{HolidayApiClient, HolidayLookup};
use crate::loader::{ChunkedLoader, LoadReport};
use crate::provision::TableProvisioner;
use crate::queries::QueryTemplateSet;
use crate::store::{DuckDbStore, PostgresStore, RelationalStore};
use std::sync::Arc;
use tracing::{error, info};

/// One configured run of the loader
#[derive(Debug, Clone)]
pub struct Driver {
    config: RunConfig,
    queries: Arc<QueryTemplateSet>,
}

impl Driver {
    pub fn new(config: RunConfig, queries: QueryTemplateSet) -> Self {
        Self {
            config,
            queries: Arc::new(queries),
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Build the store selected by the configuration
    pub fn build_store(&self) -> Result<Arc<dyn RelationalStore>> {
        match self.config.store {
            StoreKind::Postgres => {
                let connection = self
                    .config
                    .connection
                    .as_ref()
                    .ok_or_else(|| Error::missing_field("connection"))?;
                info!(connection = %connection.connection_info(), "Using PostgreSQL store");
                Ok(Arc::new(PostgresStore::new(connection)))
            }
            StoreKind::Duckdb => {
                let path = self
                    .config
                    .duckdb_path
                    .as_ref()
                    .ok_or_else(|| Error::missing_field("duckdb_path"))?;
                info!(path = %path.display(), "Using DuckDB store");
                Ok(Arc::new(DuckDbStore::new(path.clone())))
            }
        }
    }

    /// Run against the configured store and the holiday API
    pub async fn run(&self) -> Result<LoadReport> {
        let store = self.build_store()?;
        let lookup = Arc::new(HolidayApiClient::new(&self.config.holiday_api)?);
        self.run_with(store, lookup).await
    }

    /// Run against explicit collaborators
    pub async fn run_with(
        &self,
        store: Arc<dyn RelationalStore>,
        lookup: Arc<dyn HolidayLookup>,
    ) -> Result<LoadReport> {
        let result = self.execute(store, lookup).await;
        if let Err(e) = &result {
            error!(
                range = %self.config.range,
                kind = ?e.kind(),
                transient = e.is_transient(),
                "Load failed: {e}"
            );
        }
        result
    }

    async fn execute(
        &self,
        store: Arc<dyn RelationalStore>,
        lookup: Arc<dyn HolidayLookup>,
    ) -> Result<LoadReport> {
        let config = &self.config;
        info!(
            backend = store.backend(),
            source_table = %config.tables.source,
            target_table = %config.tables.target,
            range = %config.range,
            chunk_size = config.chunk_size,
            "Starting load"
        );

        let provisioner = TableProvisioner::new(store.clone(), self.queries.clone());
        provisioner.ensure_tables(&config.tables).await?;
        provisioner.ensure_index(&config.tables.target).await?;

        let enricher = CalendarEnricher::new(Arc::new(PersianCalendar), lookup)
            .with_lookup_concurrency(config.lookup_concurrency);
        let loader = ChunkedLoader::new(
            enricher,
            store,
            self.queries.clone(),
            config.tables.clone(),
        );

        if config.reset_staging {
            loader.reset_staging().await?;
        }

        loader.process(config.range, config.chunk_size).await
    }
}
