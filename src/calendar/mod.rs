//! Calendar enrichment
//!
//! Turns a Gregorian date range into [`CalendarRow`]s carrying the Jalali
//! date, its numeric breakdown, Persian names and the holiday flag.
//!
//! # Overview
//!
//! - `CalendarConverter` - Gregorian to secondary calendar conversion
//! - `PersianCalendar` - Jalali converter backed by `icu_calendar`
//! - `CalendarEnricher` - produces one row per day of a range
//! - `names` - fixed Persian name tables

mod enricher;
pub mod names;
mod persian;
mod row;

pub use enricher::CalendarEnricher;
pub use persian::{day_of_year, quarter_of_month, week_of_year, weekday_number, PersianCalendar};
pub use row::CalendarRow;

use crate::error::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A date in the secondary calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SecondaryDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl fmt::Display for SecondaryDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Gregorian to secondary calendar conversion
///
/// Fails with [`crate::Error::Conversion`] for dates the calendar cannot
/// represent.
pub trait CalendarConverter: Send + Sync {
    fn convert(&self, date: NaiveDate) -> Result<SecondaryDate>;
}
