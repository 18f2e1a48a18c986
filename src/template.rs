//! Template interpolation for SQL query templates
//!
//! Handles `{{ name }}` placeholders. Names are flat identifiers such as
//! `{{ source_schema }}`; values are plain strings.

use crate::error::{Error, Result};
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

/// Regex for matching template variables: {{ name }}
static TEMPLATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*\}\}").unwrap());

/// Variables available while rendering a template
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    vars: HashMap<String, String>,
}

impl TemplateContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, replacing any previous value
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Get a variable by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

/// Render a template string with the given context
///
/// Every placeholder must be defined; the error lists all undefined names.
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let mut missing = BTreeSet::new();

    let rendered = TEMPLATE_REGEX.replace_all(template, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        match ctx.get(name) {
            Some(value) => value.to_string(),
            None => {
                missing.insert(name.to_string());
                String::new()
            }
        }
    });

    if missing.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(Error::undefined_var(
            missing.into_iter().collect::<Vec<_>>().join(", "),
        ))
    }
}

/// Distinct variable names used by a template
pub fn extract_variables(template: &str) -> BTreeSet<String> {
    TEMPLATE_REGEX
        .captures_iter(template)
        .map(|cap| cap[1].to_string())
        .collect()
}
