use super::names::{month_name, quarter_name, weekday_name};
use super::persian::{quarter_of_month, week_of_year, weekday_number};
use super::SecondaryDate;
use crate::holiday::HolidayInfo;
use crate::store::{Column, ColumnType, RowBatch, SqlValue};
use chrono::NaiveDate;
use serde::Serialize;

/// One enriched Gregorian day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarRow {
    pub gregorian_date: NaiveDate,
    pub secondary_date: SecondaryDate,
    pub secondary_year: i32,
    pub secondary_month: u32,
    pub secondary_day: u32,
    /// 0 = Saturday .. 6 = Friday
    pub secondary_weekday: u32,
    pub secondary_week_of_year: u32,
    pub secondary_quarter: u32,
    pub secondary_quarter_name: String,
    pub secondary_month_name: String,
    pub secondary_weekday_name: String,
    pub is_holiday: bool,
    pub holiday_events: String,
}

impl CalendarRow {
    /// Staging table columns, in the order [`CalendarRow::values`] yields them
    pub const COLUMNS: [(&'static str, ColumnType); 13] = [
        ("date", ColumnType::Date),
        ("jdate", ColumnType::Text),
        ("jyear_number", ColumnType::Integer),
        ("jmonth_number", ColumnType::Integer),
        ("jday_number", ColumnType::Integer),
        ("jweekday_number", ColumnType::Integer),
        ("jweek_number", ColumnType::Integer),
        ("jquarter_number", ColumnType::Integer),
        ("jquarter_name", ColumnType::Text),
        ("jmonth_name", ColumnType::Text),
        ("jweekday_name", ColumnType::Text),
        ("is_holiday", ColumnType::Boolean),
        ("holiday_events", ColumnType::Text),
    ];

    /// Derive every calendar field of a day from its two dates
    pub fn derive(gregorian: NaiveDate, secondary: SecondaryDate, holiday: HolidayInfo) -> Self {
        let weekday = weekday_number(gregorian);
        let quarter = quarter_of_month(secondary.month);

        Self {
            gregorian_date: gregorian,
            secondary_date: secondary,
            secondary_year: secondary.year,
            secondary_month: secondary.month,
            secondary_day: secondary.day,
            secondary_weekday: weekday,
            secondary_week_of_year: week_of_year(&secondary, weekday),
            secondary_quarter: quarter,
            secondary_quarter_name: quarter_name(quarter.into()).to_string(),
            secondary_month_name: month_name(secondary.month.into()).to_string(),
            secondary_weekday_name: weekday_name(weekday.into()).to_string(),
            is_holiday: holiday.is_holiday,
            holiday_events: holiday.events,
        }
    }

    /// Column values in [`CalendarRow::COLUMNS`] order
    pub fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Date(self.gregorian_date),
            SqlValue::Text(self.secondary_date.to_string()),
            SqlValue::Int(self.secondary_year.into()),
            SqlValue::Int(self.secondary_month.into()),
            SqlValue::Int(self.secondary_day.into()),
            SqlValue::Int(self.secondary_weekday.into()),
            SqlValue::Int(self.secondary_week_of_year.into()),
            SqlValue::Int(self.secondary_quarter.into()),
            SqlValue::Text(self.secondary_quarter_name.clone()),
            SqlValue::Text(self.secondary_month_name.clone()),
            SqlValue::Text(self.secondary_weekday_name.clone()),
            SqlValue::Bool(self.is_holiday),
            SqlValue::Text(self.holiday_events.clone()),
        ]
    }

    /// Pack rows into a batch for [`crate::store::RelationalStore::bulk_append`]
    pub fn batch(rows: &[CalendarRow]) -> RowBatch {
        let columns = Self::COLUMNS
            .iter()
            .map(|(name, column_type)| Column::new(*name, *column_type))
            .collect();
        RowBatch::from_parts(columns, rows.iter().map(CalendarRow::values).collect())
    }
}
