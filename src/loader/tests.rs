//! Tests for the chunked loader

use super::*;
use crate::calendar::PersianCalendar;
use crate::error::{Error, ErrorKind};
use crate::holiday::{HolidayInfo, HolidayLookup};
use crate::store::testing::{RecordingStore, StoreCall};
use crate::types::TableRef;
use async_trait::async_trait;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::io::Write;
use std::sync::Mutex;

const MERGE: &str = "MERGE staging.calendar INTO dw.dim_date";
const TRUNCATE: &str = "TRUNCATE staging.calendar";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

struct StubLookup {
    fail_on: Option<NaiveDate>,
}

#[async_trait]
impl HolidayLookup for StubLookup {
    async fn lookup(&self, day: NaiveDate) -> crate::Result<HolidayInfo> {
        if Some(day) == self.fail_on {
            return Err(Error::lookup(day, "timed out"));
        }
        Ok(HolidayInfo::none())
    }
}

fn loader(store: Arc<RecordingStore>, fail_on: Option<NaiveDate>) -> ChunkedLoader {
    let queries = QueryTemplateSet::new(
        "CREATE TABLE {{ schema }}.{{ table }}",
        "CREATE INDEX ON {{ target_schema }}.{{ target_table }}",
        "MERGE {{ source_schema }}.{{ source_table }} INTO {{ target_schema }}.{{ target_table }}",
        "TRUNCATE {{ source_schema }}.{{ source_table }}",
    )
    .unwrap();
    let tables = TablePair {
        source: TableRef::new("staging", "calendar").unwrap(),
        target: TableRef::new("dw", "dim_date").unwrap(),
    };
    let enricher = CalendarEnricher::new(Arc::new(PersianCalendar), Arc::new(StubLookup { fail_on }));
    ChunkedLoader::new(enricher, store, Arc::new(queries), tables)
}

/// Collects formatted log lines for the current thread
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn append(rows: usize, first: NaiveDate, last: NaiveDate) -> StoreCall {
    StoreCall::Append {
        table: "staging.calendar".to_string(),
        rows,
        first: Some(first),
        last: Some(last),
    }
}

fn execute(sql: &str) -> StoreCall {
    StoreCall::Execute(sql.to_string())
}

#[tokio::test]
async fn test_short_range_is_one_window() {
    let store = Arc::new(RecordingStore::new());
    let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 5)).unwrap();

    let report = loader(store.clone(), None).process(range, 30).await.unwrap();

    assert_eq!(
        store.calls(),
        vec![
            append(5, date(2024, 1, 1), date(2024, 1, 5)),
            execute(MERGE),
            execute(TRUNCATE),
        ]
    );
    assert_eq!(report.rows_loaded, 5);
    assert_eq!(
        report.windows,
        vec![DateWindow {
            start: date(2024, 1, 1),
            end: date(2024, 1, 5)
        }]
    );
}

#[tokio::test]
async fn test_windows_run_append_merge_truncate_in_order() {
    let store = Arc::new(RecordingStore::new());
    let range = DateRange::new(date(2024, 1, 1), date(2024, 3, 1)).unwrap();

    let report = loader(store.clone(), None).process(range, 30).await.unwrap();

    assert_eq!(
        store.calls(),
        vec![
            append(30, date(2024, 1, 1), date(2024, 1, 30)),
            execute(MERGE),
            execute(TRUNCATE),
            append(30, date(2024, 1, 31), date(2024, 2, 29)),
            execute(MERGE),
            execute(TRUNCATE),
            append(1, date(2024, 3, 1), date(2024, 3, 1)),
            execute(MERGE),
            execute(TRUNCATE),
        ]
    );
    assert_eq!(report.windows.len(), 3);
    assert_eq!(report.rows_loaded, 61);
}

#[tokio::test]
async fn test_lookup_failure_stops_before_staging() {
    let store = Arc::new(RecordingStore::new());
    let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 10)).unwrap();

    let err = loader(store.clone(), Some(date(2024, 1, 3)))
        .process(range, 30)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Lookup);
    match &err {
        Error::Window {
            start, end, stage, ..
        } => {
            assert_eq!((*start, *end), (date(2024, 1, 1), date(2024, 1, 10)));
            assert_eq!(*stage, Stage::Enriching);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_failure_in_later_window_keeps_earlier_windows() {
    let store = Arc::new(RecordingStore::new());
    let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 20)).unwrap();

    let err = loader(store.clone(), Some(date(2024, 1, 12)))
        .process(range, 10)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("2024-01-11 - 2024-01-20"));
    assert_eq!(
        store.calls(),
        vec![
            append(10, date(2024, 1, 1), date(2024, 1, 10)),
            execute(MERGE),
            execute(TRUNCATE),
        ]
    );
}

#[tokio::test]
async fn test_append_failure_skips_merge() {
    let store = Arc::new(RecordingStore::failing_append());
    let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 5)).unwrap();

    let err = loader(store.clone(), None).process(range, 30).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Write);
    assert!(err.to_string().contains("staging"));
    assert_eq!(store.executed(), Vec::<String>::new());
}

#[tokio::test]
async fn test_merge_failure_leaves_staging_untouched() {
    let store = Arc::new(RecordingStore::failing_execute("MERGE"));
    let range = DateRange::new(date(2024, 1, 1), date(2024, 2, 15)).unwrap();

    let err = loader(store.clone(), None).process(range, 30).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Query);
    assert!(err.to_string().contains("merging"));
    // no truncate, no second window
    assert_eq!(
        store.calls(),
        vec![append(30, date(2024, 1, 1), date(2024, 1, 30)), execute(MERGE)]
    );
}

#[tokio::test]
async fn test_zero_chunk_size_does_nothing() {
    let store = Arc::new(RecordingStore::new());
    let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 5)).unwrap();

    let err = loader(store.clone(), None).process(range, 0).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_reset_staging_runs_truncate() {
    let store = Arc::new(RecordingStore::new());
    loader(store.clone(), None).reset_staging().await.unwrap();
    assert_eq!(store.calls(), vec![execute(TRUNCATE)]);
}

#[tokio::test]
async fn test_merge_and_truncate_are_logged_per_window() {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer({
            let logs = logs.clone();
            move || logs.clone()
        })
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let store = Arc::new(RecordingStore::new());
    let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 20)).unwrap();
    loader(store, None).process(range, 10).await.unwrap();

    let output = logs.contents();
    let merged: Vec<_> = output.match_indices("Source merged into target table").collect();
    let truncated: Vec<_> = output
        .match_indices("Table staging.calendar truncated")
        .collect();
    assert_eq!(merged.len(), 2, "{output}");
    assert_eq!(truncated.len(), 2, "{output}");
    assert!(merged[0].0 < truncated[0].0);
    assert!(output.contains("target_table=dw.dim_date"), "{output}");
}

#[tokio::test]
async fn test_failed_merge_is_not_logged_as_merged() {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer({
            let logs = logs.clone();
            move || logs.clone()
        })
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let store = Arc::new(RecordingStore::failing_execute("MERGE"));
    let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 5)).unwrap();
    loader(store, None).process(range, 30).await.unwrap_err();

    let output = logs.contents();
    assert!(!output.contains("Source merged"), "{output}");
    assert!(!output.contains("truncated"), "{output}");
}
