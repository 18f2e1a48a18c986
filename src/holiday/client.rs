//! holidayapi.ir client
//!
//! One GET per day: `{base_url}/gregorian/YYYY/MM/DD`, answered with
//!
//! ```json
//! { "events": [ { "description": "...", "is_holiday": true }, ... ] }
//! ```

use super::{join_events, HolidayInfo, HolidayLookup};
use crate::error::{Error, Result};
use crate::http::{BackoffType, HttpClient, HttpClientConfig, RateLimiterConfig};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Connection settings for the holiday API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HolidayApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub max_retries: u32,
    /// Delay growth between retries, only used when `max_retries > 0`
    #[serde(default)]
    pub backoff: BackoffType,
    #[serde(default)]
    pub rate_limit: Option<RateLimiterConfig>,
}

fn default_base_url() -> String {
    "https://holidayapi.ir".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

impl Default for HolidayApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
            backoff: BackoffType::default(),
            rate_limit: None,
        }
    }
}

/// Response body of a per-day query
#[derive(Debug, Clone, Deserialize)]
pub struct HolidayResponse {
    pub events: Vec<HolidayEvent>,
}

/// One calendar event on a day
#[derive(Debug, Clone, Deserialize)]
pub struct HolidayEvent {
    pub description: String,
    pub is_holiday: bool,
}

impl From<HolidayResponse> for HolidayInfo {
    fn from(response: HolidayResponse) -> Self {
        let flagged: Vec<_> = response
            .events
            .into_iter()
            .filter(|e| e.is_holiday)
            .map(|e| e.description)
            .collect();

        Self {
            is_holiday: !flagged.is_empty(),
            events: join_events(flagged),
        }
    }
}

/// [`HolidayLookup`] backed by holidayapi.ir
#[derive(Debug)]
pub struct HolidayApiClient {
    client: HttpClient,
}

impl HolidayApiClient {
    pub fn new(config: &HolidayApiConfig) -> Result<Self> {
        let http = HttpClientConfig::builder()
            .base_url(&config.base_url)
            .timeout(Duration::from_secs(config.timeout_secs))
            .max_retries(config.max_retries)
            .backoff(
                config.backoff,
                Duration::from_millis(200),
                Duration::from_secs(10),
            )
            .rate_limit(config.rate_limit.clone())
            .build();

        Ok(Self {
            client: HttpClient::with_config(http)?,
        })
    }

    /// Request path for a day, e.g. `/gregorian/2024/03/20`
    pub fn path_for(date: NaiveDate) -> String {
        format!("/gregorian/{}", date.format("%Y/%m/%d"))
    }
}

#[async_trait]
impl HolidayLookup for HolidayApiClient {
    async fn lookup(&self, date: NaiveDate) -> Result<HolidayInfo> {
        let path = Self::path_for(date);
        let response: HolidayResponse = self
            .client
            .get_json(&path)
            .await
            .map_err(|e| Error::lookup(date, e.to_string()))?;

        debug!(%date, "Checked holiday status");
        Ok(response.into())
    }
}
