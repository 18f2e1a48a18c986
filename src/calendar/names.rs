//! Persian names for Jalali quarters, months and weekdays
//!
//! Lookups are total: any number outside a table maps to [`UNKNOWN`].

/// Name returned for numbers outside a table's domain
pub const UNKNOWN: &str = "Unknown";

const QUARTERS: [&str; 4] = ["بهار", "تابستان", "پاییز", "زمستان"];

const MONTHS: [&str; 12] = [
    "فروردین",
    "اردیبهشت",
    "خرداد",
    "تیر",
    "مرداد",
    "شهریور",
    "مهر",
    "آبان",
    "آذر",
    "دی",
    "بهمن",
    "اسفند",
];

// Saturday first
const WEEKDAYS: [&str; 7] = [
    "شنبه",
    "یک\u{200c}شنبه",
    "دوشنبه",
    "سه\u{200c}شنبه",
    "چهارشنبه",
    "پنج\u{200c}شنبه",
    "جمعه",
];

/// Season name for quarter 1..=4
pub fn quarter_name(quarter: i64) -> &'static str {
    one_based(&QUARTERS, quarter)
}

/// Month name for month 1..=12
pub fn month_name(month: i64) -> &'static str {
    one_based(&MONTHS, month)
}

/// Weekday name for weekday 0..=6, where 0 is Saturday
pub fn weekday_name(weekday: i64) -> &'static str {
    usize::try_from(weekday)
        .ok()
        .and_then(|i| WEEKDAYS.get(i))
        .copied()
        .unwrap_or(UNKNOWN)
}

fn one_based(table: &[&'static str], number: i64) -> &'static str {
    usize::try_from(number)
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| table.get(i))
        .copied()
        .unwrap_or(UNKNOWN)
}
