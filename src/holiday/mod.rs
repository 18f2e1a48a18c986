//! Holiday lookup
//!
//! The enricher asks an injected [`HolidayLookup`] about every day it
//! produces. [`HolidayApiClient`] is the production implementation backed by
//! the holidayapi.ir REST service; tests supply their own stubs.

mod client;

pub use client::{HolidayApiClient, HolidayApiConfig, HolidayEvent, HolidayResponse};

use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Holiday status of one Gregorian day
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayInfo {
    pub is_holiday: bool,
    /// Descriptions of the holiday events, joined with `", "`
    pub events: String,
}

impl HolidayInfo {
    /// Working day with no events
    pub fn none() -> Self {
        Self::default()
    }

    /// Holiday with the given event descriptions
    pub fn holiday<I, S>(events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            is_holiday: true,
            events: join_events(events),
        }
    }
}

/// Per-day holiday query
///
/// Implementations must fail with [`crate::Error::Lookup`] rather than guess
/// "not a holiday" when the answer is unavailable.
#[async_trait]
pub trait HolidayLookup: Send + Sync {
    async fn lookup(&self, date: NaiveDate) -> Result<HolidayInfo>;
}

pub(crate) fn join_events<I, S>(events: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    events
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
