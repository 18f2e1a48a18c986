use super::{CalendarConverter, CalendarRow, SecondaryDate};
use crate::error::Result;
use crate::holiday::{HolidayInfo, HolidayLookup};
use crate::types::DateRange;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::debug;

/// Produces one [`CalendarRow`] per day of a date range
///
/// Conversion runs for the whole range before the first holiday lookup is
/// issued, so a bad date fails fast without touching the network. Any failure
/// aborts the call; there is no partial result.
#[derive(Clone)]
pub struct CalendarEnricher {
    converter: Arc<dyn CalendarConverter>,
    lookup: Arc<dyn HolidayLookup>,
    lookup_concurrency: usize,
}

impl CalendarEnricher {
    pub fn new(converter: Arc<dyn CalendarConverter>, lookup: Arc<dyn HolidayLookup>) -> Self {
        Self {
            converter,
            lookup,
            lookup_concurrency: 1,
        }
    }

    /// Allow up to `n` holiday lookups in flight at once. Rows keep date order
    /// and the earliest failing date is the one reported.
    pub fn with_lookup_concurrency(mut self, n: usize) -> Self {
        self.lookup_concurrency = n.max(1);
        self
    }

    pub fn lookup_concurrency(&self) -> usize {
        self.lookup_concurrency
    }

    /// Enrich every day in `[start, end]`, ascending
    pub async fn enrich(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<CalendarRow>> {
        let range = DateRange::new(start, end)?;

        let converted = range
            .days()
            .map(|day| Ok((day, self.converter.convert(day)?)))
            .collect::<Result<Vec<(NaiveDate, SecondaryDate)>>>()?;

        let holidays = self.lookup_all(&converted).await?;

        let rows: Vec<CalendarRow> = converted
            .into_iter()
            .zip(holidays)
            .map(|((gregorian, secondary), holiday)| {
                CalendarRow::derive(gregorian, secondary, holiday)
            })
            .collect();

        debug!(%start, %end, rows = rows.len(), "Enriched date range");
        Ok(rows)
    }

    async fn lookup_all(&self, days: &[(NaiveDate, SecondaryDate)]) -> Result<Vec<HolidayInfo>> {
        if self.lookup_concurrency <= 1 {
            let mut holidays = Vec::with_capacity(days.len());
            for (day, _) in days {
                holidays.push(self.lookup.lookup(*day).await?);
            }
            return Ok(holidays);
        }

        stream::iter(days.iter().map(|(day, _)| self.lookup.lookup(*day)))
            .buffered(self.lookup_concurrency)
            .try_collect()
            .await
    }
}

impl std::fmt::Debug for CalendarEnricher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalendarEnricher")
            .field("lookup_concurrency", &self.lookup_concurrency)
            .finish_non_exhaustive()
    }
}
