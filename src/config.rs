use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Environment variable naming the directory that holds every store file.
pub const DATA_DIR_ENV: &str = "STOCKWATCH_DATA_DIR";

/// Maximum lookback accepted by the OHLC query, in calendar days.
pub const MAX_OHLC_DAYS: i64 = 10_000;

/// Default OHLC lookback when the caller does not pass one.
pub const DEFAULT_OHLC_DAYS: i64 = 360;

/// Points shown by default in the McClellan summation chart.
pub const DEFAULT_MCCLELLAN_WINDOW: usize = 200;

/// Settings key holding the chart moving-average configuration.
pub const CHART_MA_SETTINGS_KEY: &str = "chart_ma_config";

/// A logical local store. Each one is a database file (SQLite as written by
/// the data pipeline, or native DuckDB) attached to the shared connection
/// under [`Store::alias`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Store {
    /// Watchlists, items, comments and settings. The only writable store.
    App,
    /// Per-symbol daily metrics snapshots produced by the data pipeline.
    Metrics,
    /// Daily OHLC price bars.
    Stocks,
    /// Market breadth statistics per group.
    Breadth,
    /// Ticker reference data (name, sector, industry).
    StocksLists,
}

impl Store {
    pub const ALL: [Store; 5] = [
        Store::App,
        Store::Metrics,
        Store::Stocks,
        Store::Breadth,
        Store::StocksLists,
    ];

    /// Catalog name the store is attached under.
    pub fn alias(self) -> &'static str {
        match self {
            Store::App => "app",
            Store::Metrics => "metrics",
            Store::Stocks => "stocks",
            Store::Breadth => "breadth",
            Store::StocksLists => "stocks_lists",
        }
    }

    /// Whether the crate ever writes to this store.
    pub fn read_only(self) -> bool {
        !matches!(self, Store::App)
    }

    /// Environment variable that overrides this store's file path.
    pub fn env_var(self) -> &'static str {
        match self {
            Store::App => "STOCKWATCH_APP_DB",
            Store::Metrics => "STOCKWATCH_METRICS_DB",
            Store::Stocks => "STOCKWATCH_STOCKS_DB",
            Store::Breadth => "STOCKWATCH_BREADTH_DB",
            Store::StocksLists => "STOCKWATCH_STOCKS_LISTS_DB",
        }
    }
}

/// Default file name of each store inside the data directory.
pub fn store_files() -> HashMap<Store, &'static str> {
    HashMap::from([
        (Store::App, "app_data.db"),
        (Store::Metrics, "metrics.db"),
        (Store::Stocks, "stocks.db"),
        (Store::Breadth, "breadth.db"),
        (Store::StocksLists, "stocks_lists.db"),
    ])
}

const SQLITE_HEADER: &[u8; 16] = b"SQLite format 3\0";

/// On-disk format of a store file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFormat {
    DuckDb,
    /// Attached through DuckDB's `sqlite` extension.
    Sqlite,
}

impl StoreFormat {
    /// Sniff the file header. Files that are missing, short or not SQLite
    /// are treated as DuckDB; a missing app store is created in that format.
    pub fn detect(path: &Path) -> StoreFormat {
        let mut header = [0u8; 16];
        let is_sqlite = File::open(path)
            .and_then(|mut f| f.read_exact(&mut header))
            .map(|()| &header == SQLITE_HEADER)
            .unwrap_or(false);
        if is_sqlite {
            StoreFormat::Sqlite
        } else {
            StoreFormat::DuckDb
        }
    }
}

/// Resolve the data directory: `$STOCKWATCH_DATA_DIR`, then `./data` if it
/// exists, then the platform local-data directory.
pub fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    let local = PathBuf::from("data");
    if local.is_dir() {
        return local;
    }
    if let Some(data) = dirs::data_local_dir() {
        data.join("stockwatch")
    } else {
        local
    }
}

/// Resolve the file path for a store, honouring its environment override.
pub fn store_path(data_dir: &Path, store: Store) -> PathBuf {
    if let Ok(p) = std::env::var(store.env_var()) {
        if !p.trim().is_empty() {
            return PathBuf::from(p);
        }
    }
    let files = store_files();
    data_dir.join(files[&store])
}
