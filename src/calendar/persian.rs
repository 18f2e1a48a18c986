//! Solar Hijri (Jalali) calendar
//!
//! Date conversion is delegated to `icu_calendar`; this module only derives
//! the extra numbering the loader stores (weekday, week of year, quarter).

use super::{CalendarConverter, SecondaryDate};
use crate::error::{Error, Result};
use chrono::{Datelike, NaiveDate};
use icu_calendar::persian::Persian;
use icu_calendar::Date;

/// [`CalendarConverter`] for the Jalali calendar
#[derive(Debug, Clone, Copy, Default)]
pub struct PersianCalendar;

impl CalendarConverter for PersianCalendar {
    fn convert(&self, date: NaiveDate) -> Result<SecondaryDate> {
        let month = u8::try_from(date.month())
            .map_err(|_| Error::conversion(date, "month out of range"))?;
        let day = u8::try_from(date.day())
            .map_err(|_| Error::conversion(date, "day out of range"))?;

        let iso = Date::try_new_iso_date(date.year(), month, day)
            .map_err(|e| Error::conversion(date, e.to_string()))?;
        let persian = iso.to_calendar(Persian::default());

        Ok(SecondaryDate {
            year: persian.year().number,
            month: persian.month().ordinal,
            day: persian.day_of_month().0,
        })
    }
}

/// Jalali weekday number, 0 = Saturday through 6 = Friday
pub fn weekday_number(gregorian: NaiveDate) -> u32 {
    (gregorian.weekday().num_days_from_monday() + 2) % 7
}

/// Quarter (season) of a Jalali month, 1..=4
pub fn quarter_of_month(month: u32) -> u32 {
    (month.saturating_sub(1)) / 3 + 1
}

/// Day of the Jalali year, 1-based
///
/// The first six months have 31 days, the next five 30, Esfand 29 or 30.
pub fn day_of_year(date: &SecondaryDate) -> u32 {
    let month = date.month.clamp(1, 12);
    if month <= 6 {
        (month - 1) * 31 + date.day
    } else {
        186 + (month - 7) * 30 + date.day
    }
}

/// Week of the Jalali year, 1..=53
///
/// Weeks start on Saturday and week 1 is the week holding 1 Farvardin.
pub fn week_of_year(date: &SecondaryDate, weekday: u32) -> u32 {
    let offset = day_of_year(date) - 1;
    // weekday of 1 Farvardin
    let first_weekday = (weekday + 7 * 53 - offset % 7) % 7;
    (offset + first_weekday) / 7 + 1
}
