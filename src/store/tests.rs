//! Tests for the store module, run against a temporary DuckDB file

use super::*;
use crate::error::ErrorKind;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn store() -> (TempDir, DuckDbStore) {
    let dir = TempDir::new().unwrap();
    let store = DuckDbStore::new(dir.path().join("calendar.duckdb"));
    (dir, store)
}

fn events_table() -> TableRef {
    TableRef::new("staging", "events").unwrap()
}

fn events_batch() -> RowBatch {
    let mut batch = RowBatch::new(vec![
        Column::new("day", ColumnType::Date),
        Column::new("label", ColumnType::Text),
        Column::new("n", ColumnType::Integer),
        Column::new("flag", ColumnType::Boolean),
    ]);
    batch
        .push(vec![
            SqlValue::Date(date(2024, 3, 20)),
            SqlValue::Text("نوروز".into()),
            SqlValue::Int(1),
            SqlValue::Bool(true),
        ])
        .unwrap();
    batch
        .push(vec![
            SqlValue::Date(date(2024, 3, 21)),
            SqlValue::Null,
            SqlValue::Int(2),
            SqlValue::Bool(false),
        ])
        .unwrap();
    batch
}

async fn create_events_table(store: &DuckDbStore) {
    store
        .execute(
            "CREATE SCHEMA IF NOT EXISTS staging;
             CREATE TABLE IF NOT EXISTS staging.events (
                 day DATE, label VARCHAR, n INTEGER, flag BOOLEAN
             );",
        )
        .await
        .unwrap();
}

#[test]
fn test_returns_rows() {
    assert!(returns_rows("SELECT 1"));
    assert!(returns_rows("  select * from t"));
    assert!(returns_rows("WITH x AS (SELECT 1) SELECT * FROM x"));
    assert!(!returns_rows("INSERT INTO t VALUES (1)"));
    assert!(!returns_rows("CREATE TABLE t (a INT)"));
    assert!(!returns_rows(""));
}

#[test]
fn test_returns_rows_skips_leading_comments() {
    assert!(returns_rows("-- day count\nSELECT count(*) FROM t"));
    assert!(returns_rows("/* header */ -- note\n  select 1"));
    assert!(!returns_rows("-- just a comment"));
    assert!(!returns_rows("-- cleanup\nDELETE FROM t"));
}

#[test]
fn test_returns_rows_detects_returning() {
    assert!(returns_rows("INSERT INTO t (a) VALUES (1) RETURNING a"));
    assert!(returns_rows("delete from t where a = 1 returning *"));
    assert!(!returns_rows("UPDATE t SET returning_flag = true"));
}

#[test]
fn test_row_batch_push_rejects_wrong_width() {
    let mut batch = RowBatch::new(vec![Column::new("a", ColumnType::Integer)]);
    assert!(batch.push(vec![SqlValue::Int(1)]).is_ok());
    assert!(batch.push(vec![SqlValue::Int(1), SqlValue::Int(2)]).is_err());
    assert_eq!(batch.len(), 1);
}

#[test]
fn test_row_batch_validate() {
    let table = events_table();
    let batch = RowBatch::from_parts(
        vec![Column::new("a", ColumnType::Integer)],
        vec![vec![SqlValue::Int(1)], vec![]],
    );
    let err = batch.validate(&table).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Write);
    assert!(err.to_string().contains("row 1"));

    assert!(RowBatch::default().validate(&table).is_err());
}

#[test]
fn test_row_set_accessors() {
    let set = RowSet {
        columns: vec!["n".into(), "label".into()],
        rows: vec![vec![SqlValue::Int(3), SqlValue::Text("x".into())]],
    };
    assert_eq!(set.len(), 1);
    assert_eq!(set.scalar(), Some(&SqlValue::Int(3)));
    assert_eq!(set.get(0, "label").and_then(SqlValue::as_str), Some("x"));
    assert_eq!(set.get(0, "missing"), None);
    assert_eq!(set.get(1, "n"), None);
    assert!(RowSet::empty().is_empty());
}

#[test]
fn test_sql_value_as_date_accepts_text() {
    assert_eq!(SqlValue::Text("2024-01-02".into()).as_date(), Some(date(2024, 1, 2)));
    assert_eq!(SqlValue::Date(date(2024, 1, 2)).as_date(), Some(date(2024, 1, 2)));
    assert_eq!(SqlValue::Int(1).as_date(), None);
    assert_eq!(SqlValue::Null.to_string(), "NULL");
}

#[tokio::test]
async fn test_execute_returns_rows() {
    let (_dir, store) = store();
    let set = store
        .execute("SELECT 42 AS answer, 'x' AS label, DATE '2024-01-01' AS day;")
        .await
        .unwrap();

    assert_eq!(set.columns, vec!["answer", "label", "day"]);
    assert_eq!(
        set.rows,
        vec![vec![
            SqlValue::Int(42),
            SqlValue::Text("x".into()),
            SqlValue::Date(date(2024, 1, 1)),
        ]]
    );
}

#[tokio::test]
async fn test_execute_returns_rows_after_comment_and_returning() {
    let (_dir, store) = store();

    let set = store
        .execute("-- sanity check\nSELECT 7 AS n")
        .await
        .unwrap();
    assert_eq!(set.scalar(), Some(&SqlValue::Int(7)));

    store
        .execute("CREATE TABLE days (d DATE, label VARCHAR)")
        .await
        .unwrap();
    let set = store
        .execute("INSERT INTO days VALUES (DATE '2024-03-20', 'nowruz') RETURNING label")
        .await
        .unwrap();
    assert_eq!(set.get(0, "label").and_then(SqlValue::as_str), Some("nowruz"));
}

#[tokio::test]
async fn test_execute_multiple_statements_commits() {
    let (_dir, store) = store();
    create_events_table(&store).await;

    let set = store
        .execute("INSERT INTO staging.events VALUES (DATE '2024-01-01', 'a', 1, true); INSERT INTO staging.events VALUES (DATE '2024-01-02', 'b', 2, false);")
        .await
        .unwrap();
    assert!(set.is_empty());

    // a fresh connection sees the rows
    let count = store.execute("SELECT count(*) FROM staging.events").await.unwrap();
    assert_eq!(count.scalar().and_then(SqlValue::as_i64), Some(2));
}

#[tokio::test]
async fn test_execute_bad_sql_is_query_error() {
    let (_dir, store) = store();
    let err = store.execute("SELEC nonsense").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Query);
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_bulk_append_round_trip() {
    let (_dir, store) = store();
    create_events_table(&store).await;

    let written = store
        .bulk_append(&events_table(), &events_batch())
        .await
        .unwrap();
    assert_eq!(written, 2);

    let set = store
        .execute("SELECT day, label, n, flag FROM staging.events ORDER BY day")
        .await
        .unwrap();
    assert_eq!(set.len(), 2);
    assert_eq!(set.get(0, "day").and_then(SqlValue::as_date), Some(date(2024, 3, 20)));
    assert_eq!(set.get(0, "label").and_then(SqlValue::as_str), Some("نوروز"));
    assert_eq!(set.get(0, "flag").and_then(SqlValue::as_bool), Some(true));
    assert!(set.get(1, "label").unwrap().is_null());
}

#[tokio::test]
async fn test_bulk_append_schema_mismatch_writes_nothing() {
    let (_dir, store) = store();
    create_events_table(&store).await;

    let mut batch = RowBatch::new(vec![
        Column::new("day", ColumnType::Date),
        Column::new("no_such_column", ColumnType::Text),
    ]);
    batch
        .push(vec![SqlValue::Date(date(2024, 1, 1)), SqlValue::Text("x".into())])
        .unwrap();

    let err = store.bulk_append(&events_table(), &batch).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Write);
    assert!(err.to_string().contains("staging.events"));

    let count = store.execute("SELECT count(*) FROM staging.events").await.unwrap();
    assert_eq!(count.scalar().and_then(SqlValue::as_i64), Some(0));
}

#[tokio::test]
async fn test_bulk_append_is_atomic() {
    let (_dir, store) = store();
    store
        .execute(
            "CREATE SCHEMA staging;
             CREATE TABLE staging.events (day DATE NOT NULL, label VARCHAR, n INTEGER, flag BOOLEAN);",
        )
        .await
        .unwrap();

    let mut batch = events_batch();
    // two good rows, then a NULL into a NOT NULL column
    batch
        .push(vec![
            SqlValue::Null,
            SqlValue::Text("bad".into()),
            SqlValue::Int(3),
            SqlValue::Bool(false),
        ])
        .unwrap();

    assert!(store.bulk_append(&events_table(), &batch).await.is_err());

    let count = store.execute("SELECT count(*) FROM staging.events").await.unwrap();
    assert_eq!(count.scalar().and_then(SqlValue::as_i64), Some(0));
}

#[tokio::test]
async fn test_bulk_append_empty_batch_is_noop() {
    let (_dir, store) = store();
    let batch = RowBatch::new(vec![Column::new("day", ColumnType::Date)]);
    // table does not even exist; nothing is sent
    assert_eq!(store.bulk_append(&events_table(), &batch).await.unwrap(), 0);
}
