//! SQL query templates supplied by the operator
//!
//! The four statements the pipeline runs are not hard-coded: they come from a
//! YAML file such as
//!
//! ```yaml
//! create_table: |
//!   CREATE TABLE IF NOT EXISTS {{ schema }}.{{ table }} (...);
//! create_target_table_index: |
//!   CREATE UNIQUE INDEX IF NOT EXISTS ... ON {{ target_schema }}.{{ target_table }} (date);
//! merge_source_into_target: |
//!   INSERT INTO {{ target_schema }}.{{ target_table }} SELECT * FROM {{ source_schema }}.{{ source_table }} ...
//! truncate_source_table: |
//!   TRUNCATE TABLE {{ source_schema }}.{{ source_table }};
//! ```
//!
//! Each template is checked at load time against the exact set of
//! placeholders it may use.

use crate::error::{Error, Result};
use crate::template::{self, TemplateContext};
use crate::types::TableRef;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

/// The four statements a run needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    CreateTable,
    CreateTargetIndex,
    MergeSourceIntoTarget,
    TruncateSource,
}

impl QueryKind {
    pub const ALL: [QueryKind; 4] = [
        QueryKind::CreateTable,
        QueryKind::CreateTargetIndex,
        QueryKind::MergeSourceIntoTarget,
        QueryKind::TruncateSource,
    ];

    /// Key of this template in the YAML file
    pub fn key(self) -> &'static str {
        match self {
            QueryKind::CreateTable => "create_table",
            QueryKind::CreateTargetIndex => "create_target_table_index",
            QueryKind::MergeSourceIntoTarget => "merge_source_into_target",
            QueryKind::TruncateSource => "truncate_source_table",
        }
    }

    /// Placeholders this template must use, and the only ones it may use
    pub fn placeholders(self) -> &'static [&'static str] {
        match self {
            QueryKind::CreateTable => &["schema", "table"],
            QueryKind::CreateTargetIndex => &["target_schema", "target_table"],
            QueryKind::MergeSourceIntoTarget => &[
                "source_schema",
                "source_table",
                "target_schema",
                "target_table",
            ],
            QueryKind::TruncateSource => &["source_schema", "source_table"],
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawTemplates {
    create_table: Option<String>,
    create_target_table_index: Option<String>,
    merge_source_into_target: Option<String>,
    truncate_source_table: Option<String>,
}

/// Validated, immutable set of query templates
#[derive(Debug, Clone)]
pub struct QueryTemplateSet {
    create_table: String,
    create_target_table_index: String,
    merge_source_into_target: String,
    truncate_source_table: String,
}

impl QueryTemplateSet {
    /// Build a set from the four template texts, validating placeholders
    pub fn new(
        create_table: impl Into<String>,
        create_target_table_index: impl Into<String>,
        merge_source_into_target: impl Into<String>,
        truncate_source_table: impl Into<String>,
    ) -> Result<Self> {
        let set = Self {
            create_table: create_table.into(),
            create_target_table_index: create_target_table_index.into(),
            merge_source_into_target: merge_source_into_target.into(),
            truncate_source_table: truncate_source_table.into(),
        };
        for kind in QueryKind::ALL {
            validate_placeholders(kind, set.template(kind))?;
        }
        Ok(set)
    }

    /// Parse a template set from YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let raw: RawTemplates = serde_yaml::from_str(yaml)?;
        let take = |value: Option<String>, kind: QueryKind| {
            value
                .filter(|s| !s.trim().is_empty())
                .ok_or_else(|| Error::missing_field(kind.key()))
        };

        Self::new(
            take(raw.create_table, QueryKind::CreateTable)?,
            take(raw.create_target_table_index, QueryKind::CreateTargetIndex)?,
            take(raw.merge_source_into_target, QueryKind::MergeSourceIntoTarget)?,
            take(raw.truncate_source_table, QueryKind::TruncateSource)?,
        )
    }

    /// Load a template set from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?;
        Self::from_yaml_str(&content)
    }

    /// Raw template text for a kind
    pub fn template(&self, kind: QueryKind) -> &str {
        match kind {
            QueryKind::CreateTable => &self.create_table,
            QueryKind::CreateTargetIndex => &self.create_target_table_index,
            QueryKind::MergeSourceIntoTarget => &self.merge_source_into_target,
            QueryKind::TruncateSource => &self.truncate_source_table,
        }
    }

    /// `create_table` for one table
    pub fn create_table(&self, table: &TableRef) -> Result<String> {
        let ctx = TemplateContext::new()
            .with("schema", &table.schema)
            .with("table", &table.table);
        template::render(&self.create_table, &ctx)
    }

    /// `create_target_table_index` for the target table
    pub fn create_target_index(&self, target: &TableRef) -> Result<String> {
        let ctx = TemplateContext::new()
            .with("target_schema", &target.schema)
            .with("target_table", &target.table);
        template::render(&self.create_target_table_index, &ctx)
    }

    /// `merge_source_into_target` for a source/target pair
    pub fn merge(&self, source: &TableRef, target: &TableRef) -> Result<String> {
        let ctx = TemplateContext::new()
            .with("source_schema", &source.schema)
            .with("source_table", &source.table)
            .with("target_schema", &target.schema)
            .with("target_table", &target.table);
        template::render(&self.merge_source_into_target, &ctx)
    }

    /// `truncate_source_table` for the staging table
    pub fn truncate(&self, source: &TableRef) -> Result<String> {
        let ctx = TemplateContext::new()
            .with("source_schema", &source.schema)
            .with("source_table", &source.table);
        template::render(&self.truncate_source_table, &ctx)
    }
}

fn validate_placeholders(kind: QueryKind, text: &str) -> Result<()> {
    let used = template::extract_variables(text);
    let allowed: BTreeSet<String> = kind
        .placeholders()
        .iter()
        .map(|s| (*s).to_string())
        .collect();

    let missing: Vec<_> = allowed.difference(&used).cloned().collect();
    if !missing.is_empty() {
        return Err(Error::MissingPlaceholder {
            template: kind.key().to_string(),
            placeholders: missing.join(", "),
        });
    }

    let unexpected: Vec<_> = used.difference(&allowed).cloned().collect();
    if !unexpected.is_empty() {
        return Err(Error::UnexpectedPlaceholder {
            template: kind.key().to_string(),
            placeholders: unexpected.join(", "),
        });
    }

    Ok(())
}
