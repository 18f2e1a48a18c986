//! CLI runner - executes a run

use crate::cli::commands::{Cli, OutputFormat};
use crate::config::RunConfig;
use crate::error::Result;
use crate::loader::windows;
use crate::pipeline::Driver;
use crate::queries::QueryTemplateSet;
use serde_json::{json, Value};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the load, or only plan it with `--dry-run`
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;
        let queries = QueryTemplateSet::from_file(&self.cli.queries)?;

        if self.cli.dry_run {
            return self.plan(&config, &queries);
        }

        let report = Driver::new(config, queries).run().await?;
        self.output_message(&json!({
            "type": "REPORT",
            "report": report,
        }));
        Ok(())
    }

    /// File config takes precedence over the environment
    fn load_config(&self) -> Result<RunConfig> {
        match &self.cli.config {
            Some(path) => RunConfig::from_file(path),
            None => RunConfig::from_env(),
        }
    }

    /// Render every template and list the windows without touching any store
    fn plan(&self, config: &RunConfig, queries: &QueryTemplateSet) -> Result<()> {
        let tables = &config.tables;
        let statements = json!({
            "create_source": queries.create_table(&tables.source)?,
            "create_target": queries.create_table(&tables.target)?,
            "create_index": queries.create_target_index(&tables.target)?,
            "merge": queries.merge(&tables.source, &tables.target)?,
            "truncate": queries.truncate(&tables.source)?,
        });
        let planned: Vec<_> = windows(config.range, config.chunk_size)?.collect();

        self.output_message(&json!({
            "type": "PLAN",
            "plan": {
                "store": config.store.to_string(),
                "source": tables.source.to_string(),
                "target": tables.target.to_string(),
                "range": config.range,
                "chunk_size": config.chunk_size,
                "reset_staging": config.reset_staging,
                "windows": planned,
                "statements": statements,
            }
        }));
        Ok(())
    }

    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}
