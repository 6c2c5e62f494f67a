//! DuckDB connection wrapper with store attachment and query execution.
//!
//! Every logical store is attached to one in-memory DuckDB database under its
//! alias, so queries always address tables as `<store>.<table>`:
//! - file-backed stores are `ATTACH`ed (read-only for pipeline-owned stores),
//!   SQLite files through DuckDB's `sqlite` extension
//! - in-memory stores are plain schemas with the same name, used by fixtures

use crate::config::{Store, StoreFormat};
use crate::error::{Result, StockwatchError};
use chrono::{DateTime, NaiveDate};
use duckdb::types::{TimeUnit, ValueRef};
use duckdb::Connection as DuckDbConnection;
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Named migrations for the app store, applied in order and at most once.
const APP_MIGRATIONS: &[(&str, &str)] = &[
    (
        "001_watchlists",
        "CREATE TABLE IF NOT EXISTS app.watchlists (
            id BIGINT PRIMARY KEY,
            title VARCHAR NOT NULL,
            intro VARCHAR,
            default_sort VARCHAR,
            group_by_subcategory INTEGER NOT NULL DEFAULT 0
        );",
    ),
    (
        "002_watchlist_items",
        r#"CREATE TABLE IF NOT EXISTS app.watchlist_items (
            id BIGINT PRIMARY KEY,
            watchlist_id BIGINT NOT NULL,
            ticker VARCHAR NOT NULL,
            subcategory VARCHAR,
            "position" INTEGER NOT NULL DEFAULT 0
        );"#,
    ),
    (
        "003_comments",
        "CREATE TABLE IF NOT EXISTS app.comments (
            id BIGINT PRIMARY KEY,
            watchlist_item_id BIGINT NOT NULL,
            box_index INTEGER NOT NULL,
            text VARCHAR NOT NULL,
            updated_at VARCHAR
        );",
    ),
    (
        "004_app_settings",
        "CREATE TABLE IF NOT EXISTS app.app_settings (
            key VARCHAR PRIMARY KEY,
            value VARCHAR NOT NULL
        );",
    ),
    (
        "005_item_positions",
        r#"ALTER TABLE app.watchlist_items ADD COLUMN IF NOT EXISTS "position" INTEGER DEFAULT 0;"#,
    ),
];

/// Table definitions for the pipeline-owned stores. The crate never writes
/// to these; they exist so empty stores and fixtures have the right shape.
fn pipeline_schema(store: Store) -> Option<&'static str> {
    match store {
        Store::App => None,
        Store::Metrics => Some(
            "CREATE TABLE IF NOT EXISTS metrics.metrics (
                symbol VARCHAR NOT NULL,
                date VARCHAR NOT NULL,
                daily_return DOUBLE,
                return_5d DOUBLE,
                return_21d DOUBLE,
                return_63d DOUBLE,
                return_126d DOUBLE,
                return_252d DOUBLE,
                ma10_slope DOUBLE,
                ma20_slope DOUBLE,
                ma50_slope DOUBLE,
                ma200_slope DOUBLE,
                dist_52w_high DOUBLE,
                dist_52w_low DOUBLE,
                mdd_1w DOUBLE,
                mdd_1m DOUBLE,
                mdd_3m DOUBLE,
                mdd_6m DOUBLE,
                mdd_12m DOUBLE,
                as_1w_prank DOUBLE,
                as_1m_prank DOUBLE,
                as_3m_prank DOUBLE,
                as_6m_prank DOUBLE,
                as_12m_prank DOUBLE,
                sortino_as_1w_prank DOUBLE,
                sortino_as_1m_prank DOUBLE,
                sortino_as_3m_prank DOUBLE,
                sortino_as_6m_prank DOUBLE,
                sortino_as_12m_prank DOUBLE
            );",
        ),
        Store::Stocks => Some(
            "CREATE TABLE IF NOT EXISTS stocks.prices (
                symbol VARCHAR NOT NULL,
                date VARCHAR NOT NULL,
                open DOUBLE,
                high DOUBLE,
                low DOUBLE,
                close DOUBLE,
                volume DOUBLE
            );",
        ),
        Store::Breadth => Some(
            r#"CREATE TABLE IF NOT EXISTS breadth.groups (
                id BIGINT PRIMARY KEY,
                name VARCHAR NOT NULL,
                "type" VARCHAR NOT NULL
            );
            CREATE TABLE IF NOT EXISTS breadth.breadth (
                group_id BIGINT NOT NULL,
                date VARCHAR NOT NULL,
                total BIGINT NOT NULL,
                adv BIGINT,
                "dec" BIGINT,
                new_high_52w BIGINT,
                new_low_52w BIGINT,
                above_ma5 BIGINT,
                above_ma10 BIGINT,
                above_ma20 BIGINT,
                above_ma50 BIGINT,
                above_ma200 BIGINT,
                spike_up BIGINT,
                spike_down BIGINT,
                mcclellan DOUBLE
            );"#,
        ),
        Store::StocksLists => Some(
            "CREATE TABLE IF NOT EXISTS stocks_lists.stocks (
                id BIGINT,
                ticker VARCHAR NOT NULL,
                name VARCHAR,
                sector VARCHAR,
                industry VARCHAR
            );",
        ),
    }
}

/// Wraps a DuckDB connection with every local store attached to it.
///
/// Queries address tables by store alias (`app.watchlists`,
/// `metrics.metrics`, ...), independent of whether the store is backed by a
/// file or lives in memory.
pub struct Connection {
    conn: DuckDbConnection,
    attached: RefCell<HashSet<Store>>,
}

impl Connection {
    /// Open an empty in-memory DuckDB database with no stores attached.
    pub fn open_in_memory() -> Result<Self> {
        let conn = DuckDbConnection::open_in_memory()?;
        Ok(Self {
            conn,
            attached: RefCell::new(HashSet::new()),
        })
    }

    /// Attach a store backed by a SQLite or DuckDB database file.
    ///
    /// Pipeline-owned stores are attached read-only and must already exist.
    /// The app store is created if missing and migrated.
    pub fn attach(&self, store: Store, path: &Path) -> Result<()> {
        if store.read_only() && !path.exists() {
            return Err(StockwatchError::NotFound(format!(
                "{} store not found at {}",
                store.alias(),
                path.display()
            )));
        }
        if !store.read_only() {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let format = StoreFormat::detect(path);
        let mut options = Vec::new();
        if format == StoreFormat::Sqlite {
            self.load_sqlite_extension()?;
            options.push("TYPE SQLITE");
        }
        if store.read_only() {
            options.push("READ_ONLY");
        }
        let options = if options.is_empty() {
            String::new()
        } else {
            format!(" ({})", options.join(", "))
        };

        let path_str = path.to_string_lossy().replace('\\', "/").replace('\'', "''");
        self.conn.execute_batch(&format!(
            "ATTACH '{}' AS {}{}",
            path_str,
            store.alias(),
            options
        ))?;
        self.attached.borrow_mut().insert(store);
        tracing::info!(store = store.alias(), path = %path.display(), ?format, "attached store");

        if store == Store::App {
            self.run_migrations()?;
        }
        Ok(())
    }

    /// Load the `sqlite` extension, installing it on first use.
    fn load_sqlite_extension(&self) -> Result<()> {
        if self.conn.execute_batch("LOAD sqlite").is_ok() {
            return Ok(());
        }
        tracing::info!("installing duckdb sqlite extension");
        self.conn.execute_batch("INSTALL sqlite; LOAD sqlite")?;
        Ok(())
    }

    /// Create an in-memory store: a schema named after the store alias.
    ///
    /// The app store is migrated; pipeline stores get their empty tables.
    pub fn create_in_memory_store(&self, store: Store) -> Result<()> {
        self.conn
            .execute_batch(&format!("CREATE SCHEMA IF NOT EXISTS {}", store.alias()))?;
        self.attached.borrow_mut().insert(store);
        if store == Store::App {
            self.run_migrations()?;
        } else {
            self.init_store_schema(store)?;
        }
        Ok(())
    }

    /// Create the expected tables of a pipeline-owned store if absent.
    pub fn init_store_schema(&self, store: Store) -> Result<()> {
        match pipeline_schema(store) {
            Some(ddl) => {
                self.conn.execute_batch(ddl)?;
                Ok(())
            }
            None => self.run_migrations(),
        }
    }

    /// Apply pending app-store migrations.
    pub fn run_migrations(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS app.schema_migrations (
                name VARCHAR PRIMARY KEY,
                applied_at VARCHAR
            )",
        )?;

        for (name, ddl) in APP_MIGRATIONS {
            let applied = self.execute_scalar(
                "SELECT COUNT(*) FROM app.schema_migrations WHERE name = ?",
                &[name.to_string()],
            )?;
            if applied.and_then(|v| v.as_i64()).unwrap_or(0) > 0 {
                continue;
            }
            tracing::info!(migration = name, "running migration");
            self.conn.execute_batch(ddl)?;
            self.execute_write(
                "INSERT INTO app.schema_migrations (name, applied_at) VALUES (?, ?)",
                &[name.to_string(), now_timestamp()],
            )?;
        }
        Ok(())
    }

    /// Fail with `NotFound` unless every listed store is attached.
    pub fn ensure_stores(&self, stores: &[Store]) -> Result<()> {
        let attached = self.attached.borrow();
        for store in stores {
            if !attached.contains(store) {
                return Err(StockwatchError::NotFound(format!(
                    "{} store is not attached",
                    store.alias()
                )));
            }
        }
        Ok(())
    }

    /// Execute SQL and return results as a `Vec` of `HashMap`s.
    ///
    /// Each row is represented as a `HashMap<String, serde_json::Value>`.
    /// Automatically converts DuckDB types to `serde_json::Value`.
    pub fn execute(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        let mut stmt = self.conn.prepare(sql)?;

        let param_values: Vec<&dyn duckdb::ToSql> = params
            .iter()
            .map(|p| p as &dyn duckdb::ToSql)
            .collect();

        let mut rows_result = stmt.query(param_values.as_slice())?;

        // Column metadata is only available once the statement has run.
        let (column_names, column_count) = match rows_result.as_ref() {
            Some(stmt) => (
                stmt.column_names()
                    .into_iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<String>>(),
                stmt.column_count(),
            ),
            None => (Vec::new(), 0),
        };

        let mut out: Vec<HashMap<String, serde_json::Value>> = Vec::new();

        while let Some(row) = rows_result.next()? {
            let mut map = HashMap::new();
            for (i, col_name) in column_names.iter().enumerate().take(column_count) {
                let value = convert_value_ref(row.get_ref(i)?);
                map.insert(col_name.clone(), value);
            }
            out.push(map);
        }

        Ok(out)
    }

    /// Execute SQL and deserialize each row into type `T`.
    pub fn execute_into<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<T>> {
        let rows = self.execute(sql, params)?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let value = serde_json::Value::Object(
                row.into_iter().collect::<serde_json::Map<String, serde_json::Value>>(),
            );
            let item: T = serde_json::from_value(value)?;
            results.push(item);
        }
        Ok(results)
    }

    /// Execute SQL and deserialize the first row, if any.
    pub fn execute_one<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Option<T>> {
        Ok(self.execute_into(sql, params)?.into_iter().next())
    }

    /// Execute SQL and return the first column of the first row.
    ///
    /// Returns `None` if the result set is empty.
    pub fn execute_scalar(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Option<serde_json::Value>> {
        let mut stmt = self.conn.prepare(sql)?;
        let param_values: Vec<&dyn duckdb::ToSql> = params
            .iter()
            .map(|p| p as &dyn duckdb::ToSql)
            .collect();

        let mut rows = stmt.query(param_values.as_slice())?;

        if let Some(row) = rows.next()? {
            let value = convert_value_ref(row.get_ref(0)?);
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    /// Execute a statement that modifies data and return the affected row count.
    pub fn execute_write(&self, sql: &str, params: &[String]) -> Result<usize> {
        let mut stmt = self.conn.prepare(sql)?;
        let param_values: Vec<&dyn duckdb::ToSql> = params
            .iter()
            .map(|p| p as &dyn duckdb::ToSql)
            .collect();
        Ok(stmt.execute(param_values.as_slice())?)
    }

    /// Run `f` inside a transaction, rolling back if it returns an error.
    pub fn in_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        self.conn.execute_batch("BEGIN TRANSACTION")?;
        match f(self) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK") {
                    tracing::warn!(error = %rollback, "rollback failed");
                }
                Err(e)
            }
        }
    }

    /// Create a table from a newline-delimited JSON file.
    ///
    /// `table_name` should be store-qualified (e.g. `breadth.groups`); the
    /// table is replaced if it already exists.
    pub fn register_table_from_ndjson(&self, table_name: &str, ndjson_path: &str) -> Result<()> {
        let path_fwd = ndjson_path.replace('\\', "/");
        self.conn.execute_batch(&format!(
            "DROP TABLE IF EXISTS {}; \
             CREATE TABLE {} AS SELECT * FROM read_json_auto('{}', format='newline_delimited')",
            table_name, table_name, path_fwd
        ))?;
        tracing::debug!(table = table_name, "registered table from ndjson");
        Ok(())
    }

    /// Check whether a store has been attached.
    pub fn has_store(&self, store: Store) -> bool {
        self.attached.borrow().contains(&store)
    }

    /// Return the aliases of all attached stores, sorted.
    pub fn stores(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .attached
            .borrow()
            .iter()
            .map(|s| s.alias().to_string())
            .collect();
        names.sort();
        names
    }

    /// Access the underlying DuckDB connection for advanced usage.
    pub fn raw(&self) -> &DuckDbConnection {
        &self.conn
    }
}

/// Current UTC time as `YYYY-MM-DD HH:MM:SS`.
pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Convert a DuckDB `ValueRef` to a `serde_json::Value`.
fn convert_value_ref(val: ValueRef<'_>) -> serde_json::Value {
    match val {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Boolean(b) => serde_json::Value::Bool(b),
        ValueRef::TinyInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::SmallInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::Int(n) => serde_json::Value::Number(n.into()),
        ValueRef::BigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::UTinyInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::USmallInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::UInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::UBigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::HugeInt(n) => {
            // HugeInt may not fit in i64; try i64, fallback to string
            if let Ok(i) = i64::try_from(n) {
                serde_json::Value::Number(i.into())
            } else {
                serde_json::Value::String(n.to_string())
            }
        }
        ValueRef::Float(f) => float_value(f as f64),
        ValueRef::Double(f) => float_value(f),
        ValueRef::Decimal(d) => d
            .to_string()
            .parse::<f64>()
            .map(float_value)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(bytes) => serde_json::Value::String(String::from_utf8_lossy(bytes).to_string()),
        ValueRef::Date32(days) => {
            // DuckDB dates count days from 1970-01-01
            NaiveDate::from_ymd_opt(1970, 1, 1)
                .and_then(|epoch| epoch.checked_add_signed(chrono::Duration::days(days as i64)))
                .map(|d| serde_json::Value::String(d.format("%Y-%m-%d").to_string()))
                .unwrap_or(serde_json::Value::Null)
        }
        ValueRef::Timestamp(unit, raw) => {
            let micros = match unit {
                TimeUnit::Second => raw.saturating_mul(1_000_000),
                TimeUnit::Millisecond => raw.saturating_mul(1_000),
                TimeUnit::Microsecond => raw,
                TimeUnit::Nanosecond => raw / 1_000,
            };
            DateTime::from_timestamp_micros(micros)
                .map(|ts| {
                    serde_json::Value::String(ts.naive_utc().format("%Y-%m-%d %H:%M:%S").to_string())
                })
                .unwrap_or(serde_json::Value::Null)
        }
        ValueRef::Blob(bytes) => serde_json::Value::String(format!(
            "blob:{}",
            bytes.iter().map(|b| format!("{:02x}", b)).collect::<String>()
        )),
        // Remaining types (lists, structs, intervals, ...) never appear in the stores.
        _ => serde_json::Value::Null,
    }
}

fn float_value(f: f64) -> serde_json::Value {
    serde_json::Number::from_f64(f)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}
