//! Shared test fixtures for the stockwatch integration tests.
//!
//! `setup_sample_db()` creates an in-memory DuckDB connection with every
//! store present. The app, metrics and stocks stores are filled with SQL
//! inserts into their migrated tables; breadth and stocks_lists are loaded
//! from NDJSON temp files the way the pipeline exports them.
//!
//! Sample data:
//! - watchlist 1 "Tech": MSFT, AAPL, GOOG, NVDA (saved order), default sort
//!   `return_21d_desc`, no grouping
//! - watchlist 2 "Energy": XOM, CVX, OXY, grouped by subcategory
//! - metrics on 2024-06-27 (stale) and 2024-06-28 (latest)
//! - AAPL and MSFT daily bars in January 2024
//! - breadth groups 1 (list), 2 and 3 (sectors)

#![allow(dead_code)]

use std::io::Write;

use stockwatch::{Connection, Dashboard, Store};
use tempfile::NamedTempFile;

pub const LATEST_DATE: &str = "2024-06-28";

pub fn setup_sample_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    for store in Store::ALL {
        conn.create_in_memory_store(store).unwrap();
    }

    insert_watchlists(&conn);
    insert_metrics(&conn);
    insert_prices(&conn);
    register_breadth(&conn);
    register_stocks(&conn);

    conn
}

pub fn setup_sample_dashboard() -> Dashboard {
    Dashboard::from_connection(setup_sample_db())
}

/// A connection with every store present but no rows anywhere.
pub fn setup_empty_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    for store in Store::ALL {
        conn.create_in_memory_store(store).unwrap();
    }
    conn
}

fn exec(conn: &Connection, sql: &str) {
    conn.raw().execute_batch(sql).unwrap();
}

fn insert_watchlists(conn: &Connection) {
    exec(
        conn,
        r#"
        INSERT INTO app.watchlists (id, title, intro, default_sort, group_by_subcategory) VALUES
            (1, 'Tech', 'Large-cap technology', 'return_21d_desc', 0),
            (2, 'Energy', NULL, NULL, 1);

        INSERT INTO app.watchlist_items (id, watchlist_id, ticker, subcategory, "position") VALUES
            (1, 1, 'MSFT', 'Software', 0),
            (2, 1, 'AAPL', 'Hardware', 1),
            (3, 1, 'GOOG', 'Software', 2),
            (4, 1, 'NVDA', NULL, 3),
            (5, 2, 'XOM', 'Majors', 0),
            (6, 2, 'OXY', NULL, 1),
            (7, 2, 'CVX', 'Majors', 2);

        INSERT INTO app.comments (id, watchlist_item_id, box_index, text, updated_at) VALUES
            (1, 1, 1, 'Cloud leader', '2024-06-01 09:00:00'),
            (2, 5, 2, 'Watch oil price', '2024-06-02 09:00:00');
        "#,
    );
}

fn insert_metrics(conn: &Connection) {
    exec(
        conn,
        r#"
        INSERT INTO metrics.metrics (symbol, date, daily_return, return_21d, as_1m_prank) VALUES
            ('MSFT', '2024-06-27', 0.01, 0.99, 10),
            ('MSFT', '2024-06-28', 0.02, 0.05, 40),
            ('AAPL', '2024-06-28', -0.01, 0.12, 70),
            ('GOOG', '2024-06-28', 0.00, NULL, 55),
            ('NVDA', '2024-06-28', 0.04, 0.30, 95),
            ('XOM', '2024-06-28', 0.01, 0.02, 30);
        "#,
    );
}

fn insert_prices(conn: &Connection) {
    exec(
        conn,
        r#"
        INSERT INTO stocks.prices (symbol, date, open, high, low, close, volume) VALUES
            ('AAPL', '2024-01-02', 9.5, 10.5, 9.0, 10.0, 1000),
            ('AAPL', '2024-01-03', 10.0, 11.5, 9.8, 11.0, 1100),
            ('AAPL', '2024-01-04', 11.0, 12.5, 10.9, 12.0, 1200),
            ('AAPL', '2024-01-05', 12.0, 12.2, 11.5, NULL, NULL),
            ('AAPL', '2024-01-08', 12.0, 13.5, 11.9, 13.0, 1300),
            ('AAPL', '2024-01-09', 13.0, 14.5, 12.9, 14.0, 1400),
            ('MSFT', '2024-01-02', 370.0, 375.0, 366.0, 370.9, 2000),
            ('MSFT', '2024-01-03', 369.0, 373.0, 368.0, 370.6, 2100);
        "#,
    );
}

fn register_breadth(conn: &Connection) {
    let groups = vec![
        serde_json::json!({ "id": 1, "name": "S&P 500", "type": "list" }),
        serde_json::json!({ "id": 2, "name": "Technology", "type": "sector" }),
        serde_json::json!({ "id": 3, "name": "Energy", "type": "sector" }),
    ];
    write_ndjson_and_register(conn, "breadth.groups", &groups);

    let rows = vec![
        breadth_row(1, "2024-06-25", 500, 200, 300, None),
        breadth_row(1, "2024-06-26", 500, 260, 240, Some(5.0)),
        breadth_row(1, "2024-06-27", 500, 210, 290, Some(-3.0)),
        breadth_row(1, "2024-06-28", 500, 300, 200, Some(2.0)),
        breadth_row(2, "2024-06-27", 80, 40, 40, Some(1.5)),
        breadth_row(2, "2024-06-28", 80, 60, 20, Some(2.5)),
        breadth_row(3, "2024-06-28", 0, 0, 0, None),
    ];
    write_ndjson_and_register(conn, "breadth.breadth", &rows);
}

fn breadth_row(
    group_id: i64,
    date: &str,
    total: i64,
    adv: i64,
    dec: i64,
    mcclellan: Option<f64>,
) -> serde_json::Value {
    serde_json::json!({
        "group_id": group_id,
        "date": date,
        "total": total,
        "adv": adv,
        "dec": dec,
        "new_high_52w": adv / 10,
        "new_low_52w": dec / 10,
        "above_ma5": adv,
        "above_ma10": adv,
        "above_ma20": total / 2,
        "above_ma50": total / 4,
        "above_ma200": total / 5,
        "spike_up": 1,
        "spike_down": 2,
        "mcclellan": mcclellan,
    })
}

fn register_stocks(conn: &Connection) {
    let stocks = vec![
        serde_json::json!({
            "id": 1,
            "ticker": "AAPL",
            "name": "Apple Inc.",
            "sector": "Technology",
            "industry": "Consumer Electronics"
        }),
        serde_json::json!({
            "id": 2,
            "ticker": "MSFT",
            "name": "Microsoft Corporation",
            "sector": "Technology",
            "industry": "Software"
        }),
    ];
    write_ndjson_and_register(conn, "stocks_lists.stocks", &stocks);
}

fn write_ndjson_and_register(conn: &Connection, table_name: &str, rows: &[serde_json::Value]) {
    let mut file = NamedTempFile::new().unwrap();
    for row in rows {
        writeln!(file, "{}", serde_json::to_string(row).unwrap()).unwrap();
    }
    file.flush().unwrap();

    let path = file.path().to_str().unwrap();
    conn.register_table_from_ndjson(table_name, path).unwrap();
    // DuckDB has copied the rows into an in-memory table, so the temp file
    // can go.
}
