//! Connection integration tests: raw SQL execution, store attachment,
//! migrations, transactions and type conversion.

mod common;

use std::path::Path;

use stockwatch::config::{store_files, StoreFormat};
use stockwatch::{Connection, StockwatchError, Store};

/// Write a pipeline store file with its empty tables plus `seed_sql`.
fn create_store_file(path: &Path, store: Store, seed_sql: &str) {
    let conn = Connection::open_in_memory().unwrap();
    conn.raw()
        .execute_batch(&format!(
            "ATTACH '{}' AS {}",
            path.to_string_lossy().replace('\\', "/"),
            store.alias()
        ))
        .unwrap();
    conn.init_store_schema(store).unwrap();
    conn.raw().execute_batch(seed_sql).unwrap();
    conn.raw()
        .execute_batch(&format!("DETACH {}", store.alias()))
        .unwrap();
}

// ---------------------------------------------------------------------------
// execute
// ---------------------------------------------------------------------------

#[test]
fn execute_returns_correct_rows() {
    let conn = common::setup_sample_db();

    let rows = conn
        .execute("SELECT ticker FROM app.watchlist_items ORDER BY id", &[])
        .unwrap();
    assert_eq!(rows.len(), 7);
    assert_eq!(rows[0]["ticker"], "MSFT");
    assert_eq!(rows[6]["ticker"], "CVX");
}

#[test]
fn execute_with_params() {
    let conn = common::setup_sample_db();

    let rows = conn
        .execute(
            "SELECT * FROM app.watchlist_items WHERE watchlist_id = ?",
            &["2".to_string()],
        )
        .unwrap();
    assert_eq!(rows.len(), 3);
}

#[test]
fn execute_scalar_returns_none_for_empty_result() {
    let conn = common::setup_sample_db();

    let val = conn
        .execute_scalar(
            "SELECT ticker FROM app.watchlist_items WHERE id = ?",
            &["999".to_string()],
        )
        .unwrap();
    assert!(val.is_none());
}

#[test]
fn execute_into_deserializes_rows() {
    let conn = common::setup_sample_db();

    #[derive(serde::Deserialize, Debug)]
    struct Group {
        id: i64,
        name: String,
    }

    let groups: Vec<Group> = conn
        .execute_into("SELECT id, name FROM breadth.groups ORDER BY id", &[])
        .unwrap();
    assert_eq!(groups.len(), 3);
    assert_eq!(groups[0].id, 1);
    assert_eq!(groups[0].name, "S&P 500");
}

#[test]
fn execute_write_reports_affected_rows() {
    let conn = common::setup_sample_db();

    let n = conn
        .execute_write(
            "UPDATE app.watchlist_items SET subcategory = ? WHERE watchlist_id = ?",
            &["Tech".to_string(), "1".to_string()],
        )
        .unwrap();
    assert_eq!(n, 4);
}

// ---------------------------------------------------------------------------
// Type conversions
// ---------------------------------------------------------------------------

#[test]
fn null_values_are_converted_to_json_null() {
    let conn = common::setup_sample_db();

    let rows = conn
        .execute(
            "SELECT subcategory FROM app.watchlist_items WHERE id = ?",
            &["4".to_string()],
        )
        .unwrap();
    assert!(rows[0]["subcategory"].is_null());
}

#[test]
fn dates_are_rendered_as_iso_strings() {
    let conn = common::setup_sample_db();

    let rows = conn
        .execute(
            "SELECT DATE '2024-06-28' AS d, TIMESTAMP '2024-06-28 13:45:00' AS ts",
            &[],
        )
        .unwrap();
    assert_eq!(rows[0]["d"], "2024-06-28");
    assert_eq!(rows[0]["ts"], "2024-06-28 13:45:00");
}

#[test]
fn numeric_values_are_converted_correctly() {
    let conn = common::setup_sample_db();

    let rows = conn
        .execute("SELECT 1.5::DOUBLE AS x, 12.25 AS d, 42 AS n, TRUE AS b", &[])
        .unwrap();
    assert_eq!(rows[0]["x"].as_f64(), Some(1.5));
    assert_eq!(rows[0]["d"].as_f64(), Some(12.25));
    assert_eq!(rows[0]["n"].as_i64(), Some(42));
    assert_eq!(rows[0]["b"], true);
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

#[test]
fn failed_transaction_rolls_back() {
    let conn = common::setup_sample_db();

    let result: stockwatch::Result<()> = conn.in_transaction(|c| {
        c.execute_write("DELETE FROM app.comments", &[])?;
        Err(StockwatchError::InvalidArgument("abort".into()))
    });
    assert!(result.is_err());

    let count = conn
        .execute_scalar("SELECT COUNT(*) FROM app.comments", &[])
        .unwrap()
        .unwrap();
    assert_eq!(count.as_i64(), Some(2));
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

#[test]
fn ensure_stores_reports_missing_store() {
    let conn = Connection::open_in_memory().unwrap();
    conn.create_in_memory_store(Store::App).unwrap();

    assert!(conn.ensure_stores(&[Store::App]).is_ok());
    let err = conn.ensure_stores(&[Store::App, Store::Metrics]).unwrap_err();
    assert!(matches!(err, StockwatchError::NotFound(msg) if msg.contains("metrics")));
    assert_eq!(conn.stores(), vec!["app"]);
}

#[test]
fn app_store_file_is_created_and_migrated_once() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("nested").join("app_data.duckdb");

    {
        let conn = Connection::open_in_memory().unwrap();
        conn.attach(Store::App, &path).unwrap();
        conn.execute_write(
            "INSERT INTO app.watchlists (id, title) VALUES (1, 'Persisted')",
            &[],
        )
        .unwrap();
    }
    assert!(path.exists());

    let conn = Connection::open_in_memory().unwrap();
    conn.attach(Store::App, &path).unwrap();
    let migrations = conn
        .execute_scalar("SELECT COUNT(*) FROM app.schema_migrations", &[])
        .unwrap()
        .unwrap();
    assert_eq!(migrations.as_i64(), Some(5));

    let title = conn
        .execute_scalar("SELECT title FROM app.watchlists WHERE id = 1", &[])
        .unwrap()
        .unwrap();
    assert_eq!(title, "Persisted");
}

#[test]
fn pipeline_store_must_exist() {
    let tmp = tempfile::tempdir().unwrap();
    let conn = Connection::open_in_memory().unwrap();

    let err = conn
        .attach(Store::Metrics, &tmp.path().join("metrics.duckdb"))
        .unwrap_err();
    assert!(matches!(err, StockwatchError::NotFound(_)));
    assert!(!conn.has_store(Store::Metrics));
}

#[test]
fn pipeline_store_is_attached_read_only() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("metrics.duckdb");
    create_store_file(
        &path,
        Store::Metrics,
        "INSERT INTO metrics.metrics (symbol, date, return_21d) VALUES ('AAPL', '2024-06-28', 0.1)",
    );

    let conn = Connection::open_in_memory().unwrap();
    conn.attach(Store::Metrics, &path).unwrap();

    let rows = conn.execute("SELECT symbol FROM metrics.metrics", &[]).unwrap();
    assert_eq!(rows[0]["symbol"], "AAPL");

    assert!(conn
        .execute_write("DELETE FROM metrics.metrics", &[])
        .is_err());
}

#[test]
fn legacy_app_store_gains_item_positions() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("app_data.db");
    {
        let conn = Connection::open_in_memory().unwrap();
        conn.raw()
            .execute_batch(&format!(
                "ATTACH '{}' AS app;
                 CREATE TABLE app.watchlist_items (
                     id BIGINT PRIMARY KEY,
                     watchlist_id BIGINT NOT NULL,
                     ticker VARCHAR NOT NULL,
                     subcategory VARCHAR
                 );
                 INSERT INTO app.watchlist_items VALUES (2, 1, 'MSFT', NULL), (1, 1, 'AAPL', NULL);
                 DETACH app;",
                path.to_string_lossy().replace('\\', "/")
            ))
            .unwrap();
    }

    let conn = Connection::open_in_memory().unwrap();
    conn.attach(Store::App, &path).unwrap();
    let rows = conn
        .execute(
            r#"SELECT ticker, "position" FROM app.watchlist_items ORDER BY "position", id"#,
            &[],
        )
        .unwrap();
    assert_eq!(rows[0]["ticker"], "AAPL");
    assert_eq!(rows[0]["position"], 0);
    assert_eq!(rows[1]["ticker"], "MSFT");
}

// ---------------------------------------------------------------------------
// Store files
// ---------------------------------------------------------------------------

#[test]
fn store_files_use_pipeline_names() {
    let files = store_files();
    assert_eq!(files[&Store::App], "app_data.db");
    assert_eq!(files[&Store::Metrics], "metrics.db");
    assert_eq!(files[&Store::StocksLists], "stocks_lists.db");
}

#[test]
fn store_format_is_sniffed_from_header() {
    let tmp = tempfile::tempdir().unwrap();

    let sqlite = tmp.path().join("metrics.db");
    let mut bytes = b"SQLite format 3\0".to_vec();
    bytes.resize(100, 0);
    std::fs::write(&sqlite, bytes).unwrap();
    assert_eq!(StoreFormat::detect(&sqlite), StoreFormat::Sqlite);

    let duck = tmp.path().join("app_data.db");
    Connection::open_in_memory().unwrap().attach(Store::App, &duck).unwrap();
    assert_eq!(StoreFormat::detect(&duck), StoreFormat::DuckDb);

    let short = tmp.path().join("short.db");
    std::fs::write(&short, b"SQLite").unwrap();
    assert_eq!(StoreFormat::detect(&short), StoreFormat::DuckDb);
    assert_eq!(StoreFormat::detect(&tmp.path().join("missing.db")), StoreFormat::DuckDb);
}
