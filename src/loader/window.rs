use crate::error::{Error, Result};
use crate::types::{DateRange, DateWindow};
use chrono::{Days, NaiveDate};

/// Split `range` into consecutive windows of at most `chunk_size` days
///
/// The windows are contiguous, never overlap, start at `range.start` and end
/// at `range.end`; only the last one may be shorter than `chunk_size`.
pub fn windows(range: DateRange, chunk_size: u32) -> Result<Windows> {
    if chunk_size == 0 {
        return Err(Error::invalid_value("chunk_size", "must be at least one day"));
    }
    if range.start > range.end {
        return Err(Error::invalid_value(
            "date_range",
            format!("start date {} is after end date {}", range.start, range.end),
        ));
    }

    Ok(Windows {
        current: Some(range.start),
        end: range.end,
        span: Days::new(u64::from(chunk_size - 1)),
    })
}

/// Iterator returned by [`windows`]
#[derive(Debug, Clone)]
pub struct Windows {
    current: Option<NaiveDate>,
    end: NaiveDate,
    span: Days,
}

impl Iterator for Windows {
    type Item = DateWindow;

    fn next(&mut self) -> Option<DateWindow> {
        let start = self.current?;
        let window_end = start
            .checked_add_days(self.span)
            .map_or(self.end, |d| d.min(self.end));

        let window = DateWindow {
            start,
            end: window_end,
        };
        self.current = if window_end < self.end {
            window.next_start()
        } else {
            None
        };
        Some(window)
    }
}
