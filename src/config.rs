//! Run configuration
//!
//! Everything a run needs is gathered into one [`RunConfig`], built once at
//! startup and passed down explicitly. It can come from
//!
//! - environment variables ([`RunConfig::from_env`]), using the same names
//!   the loader has always used (`PG_HOST`, `SOURCE_TABLE_NAME`, ...), or
//! - a YAML file ([`RunConfig::from_file`]).
//!
//! ```yaml
//! store: postgres
//! connection:
//!   username: loader
//!   password: secret
//!   host: localhost
//!   port: 5432
//!   database: warehouse
//! source: { schema: staging, table: jalali_calendar }
//! target: { schema: dw, table: dim_date }
//! start_date: 2024-03-20
//! end_date: 2025-03-20
//! chunk_size: 30
//! ```

use crate::error::{Error, Result};
use crate::holiday::HolidayApiConfig;
use crate::loader::DEFAULT_CHUNK_SIZE;
use crate::types::{DateRange, TablePair, TableRef};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// ============================================================================
// Environment variable names
// ============================================================================

pub const ENV_PG_USERNAME: &str = "PG_USERNAME";
pub const ENV_PG_PASSWORD: &str = "PG_PASSWORD";
pub const ENV_PG_HOST: &str = "PG_HOST";
pub const ENV_PG_PORT: &str = "PG_PORT";
pub const ENV_PG_DATABASE: &str = "PG_DATABASE";
pub const ENV_SOURCE_SCHEMA: &str = "SOURCE_SCHEMA_NAME";
pub const ENV_SOURCE_TABLE: &str = "SOURCE_TABLE_NAME";
pub const ENV_TARGET_SCHEMA: &str = "TARGET_SCHEMA_NAME";
pub const ENV_TARGET_TABLE: &str = "TARGET_TABLE_NAME";
pub const ENV_START_DATE: &str = "START_DATE";
pub const ENV_END_DATE: &str = "END_DATE";
pub const ENV_CHUNK_SIZE: &str = "CHUNK_SIZE";
pub const ENV_STORE: &str = "STORE";
pub const ENV_DUCKDB_PATH: &str = "DUCKDB_PATH";
pub const ENV_HOLIDAY_API_URL: &str = "HOLIDAY_API_URL";
pub const ENV_HOLIDAY_TIMEOUT_SECS: &str = "HOLIDAY_TIMEOUT_SECS";
pub const ENV_RESET_STAGING: &str = "RESET_STAGING";
pub const ENV_LOOKUP_CONCURRENCY: &str = "LOOKUP_CONCURRENCY";

// ============================================================================
// Connection
// ============================================================================

/// PostgreSQL connection parameters
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionConfig {
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub database: String,
}

fn default_port() -> u16 {
    5432
}

impl ConnectionConfig {
    /// Connection target for logs, password masked
    pub fn connection_info(&self) -> String {
        format!(
            "postgres://{}:****@{}:{}/{}",
            self.username, self.host, self.port, self.database
        )
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("username", &self.username)
            .field("password", &"****")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .finish()
    }
}

// ============================================================================
// Store selection
// ============================================================================

/// Which [`crate::store::RelationalStore`] backend to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Postgres,
    Duckdb,
}

impl FromStr for StoreKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(StoreKind::Postgres),
            "duckdb" => Ok(StoreKind::Duckdb),
            other => Err(Error::invalid_value(
                "store",
                format!("unknown store '{other}', expected 'postgres' or 'duckdb'"),
            )),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Postgres => f.write_str("postgres"),
            StoreKind::Duckdb => f.write_str("duckdb"),
        }
    }
}

// ============================================================================
// Run configuration
// ============================================================================

/// Complete, validated configuration of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub store: StoreKind,
    /// Required when `store` is Postgres
    pub connection: Option<ConnectionConfig>,
    /// Database file, required when `store` is DuckDB
    pub duckdb_path: Option<PathBuf>,
    pub tables: TablePair,
    pub range: DateRange,
    /// Days per window
    pub chunk_size: u32,
    pub holiday_api: HolidayApiConfig,
    /// Clear the staging table once before the first window
    pub reset_staging: bool,
    /// Holiday lookups in flight at once within a window
    pub lookup_concurrency: usize,
}

/// YAML shape of [`RunConfig`]; dates stay text until validated
#[derive(Debug, Deserialize)]
struct RawRunConfig {
    #[serde(default)]
    store: StoreKind,
    #[serde(default)]
    connection: Option<ConnectionConfig>,
    #[serde(default)]
    duckdb_path: Option<PathBuf>,
    source: TableRef,
    target: TableRef,
    start_date: String,
    end_date: String,
    #[serde(default = "default_chunk_size")]
    chunk_size: u32,
    #[serde(default)]
    holiday_api: HolidayApiConfig,
    #[serde(default = "default_true")]
    reset_staging: bool,
    #[serde(default = "default_concurrency")]
    lookup_concurrency: usize,
}

fn default_chunk_size() -> u32 {
    DEFAULT_CHUNK_SIZE
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    1
}

impl RunConfig {
    /// Build from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup, e.g. a map in tests
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| get(key).ok_or_else(|| Error::missing_field(key));

        let store = get(ENV_STORE)
            .map(|s| s.parse::<StoreKind>())
            .transpose()?
            .unwrap_or_default();

        let connection = match store {
            StoreKind::Postgres => Some(ConnectionConfig {
                username: required(ENV_PG_USERNAME)?,
                password: lookup(ENV_PG_PASSWORD).unwrap_or_default(),
                host: required(ENV_PG_HOST)?,
                port: parse_opt(ENV_PG_PORT, get(ENV_PG_PORT))?.unwrap_or_else(default_port),
                database: required(ENV_PG_DATABASE)?,
            }),
            StoreKind::Duckdb => None,
        };

        let mut holiday_api = HolidayApiConfig::default();
        if let Some(url) = get(ENV_HOLIDAY_API_URL) {
            holiday_api.base_url = url;
        }
        if let Some(secs) = parse_opt(ENV_HOLIDAY_TIMEOUT_SECS, get(ENV_HOLIDAY_TIMEOUT_SECS))? {
            holiday_api.timeout_secs = secs;
        }

        let config = Self {
            store,
            connection,
            duckdb_path: get(ENV_DUCKDB_PATH).map(PathBuf::from),
            tables: TablePair {
                source: TableRef {
                    schema: required(ENV_SOURCE_SCHEMA)?,
                    table: required(ENV_SOURCE_TABLE)?,
                },
                target: TableRef {
                    schema: required(ENV_TARGET_SCHEMA)?,
                    table: required(ENV_TARGET_TABLE)?,
                },
            },
            range: DateRange::parse(&required(ENV_START_DATE)?, &required(ENV_END_DATE)?)?,
            chunk_size: parse_opt(ENV_CHUNK_SIZE, get(ENV_CHUNK_SIZE))?
                .unwrap_or(DEFAULT_CHUNK_SIZE),
            holiday_api,
            reset_staging: get(ENV_RESET_STAGING)
                .map(|v| parse_bool(ENV_RESET_STAGING, &v))
                .transpose()?
                .unwrap_or(true),
            lookup_concurrency: parse_opt(ENV_LOOKUP_CONCURRENCY, get(ENV_LOOKUP_CONCURRENCY))?
                .unwrap_or(1),
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let raw: RawRunConfig = serde_yaml::from_str(yaml)?;

        let config = Self {
            store: raw.store,
            connection: raw.connection,
            duckdb_path: raw.duckdb_path,
            tables: TablePair {
                source: raw.source,
                target: raw.target,
            },
            range: DateRange::parse(&raw.start_date, &raw.end_date)?,
            chunk_size: raw.chunk_size,
            holiday_api: raw.holiday_api,
            reset_staging: raw.reset_staging,
            lookup_concurrency: raw.lookup_concurrency,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        self.tables.validate()?;

        if self.range.start > self.range.end {
            return Err(Error::invalid_value(
                "date_range",
                format!("start date {} is after end date {}", self.range.start, self.range.end),
            ));
        }
        if self.chunk_size == 0 {
            return Err(Error::invalid_value("chunk_size", "must be at least 1"));
        }
        if self.lookup_concurrency == 0 {
            return Err(Error::invalid_value("lookup_concurrency", "must be at least 1"));
        }
        if self.holiday_api.timeout_secs == 0 {
            return Err(Error::invalid_value("holiday_api.timeout_secs", "must be at least 1"));
        }
        url::Url::parse(&self.holiday_api.base_url).map_err(|e| {
            Error::invalid_value("holiday_api.base_url", format!("'{}': {e}", self.holiday_api.base_url))
        })?;

        match self.store {
            StoreKind::Postgres if self.connection.is_none() => {
                Err(Error::missing_field("connection"))
            }
            StoreKind::Duckdb if self.duckdb_path.is_none() => {
                Err(Error::missing_field("duckdb_path"))
            }
            _ => Ok(()),
        }
    }
}

fn parse_opt<T>(field: &str, value: Option<String>) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|e| Error::invalid_value(field, format!("'{v}': {e}")))
        })
        .transpose()
}

fn parse_bool(field: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::invalid_value(field, format!("'{other}' is not a boolean"))),
    }
}
