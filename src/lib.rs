//! Stockwatch: the data layer of a stock-watching dashboard.
//!
//! Watchlists, comments and chart settings live in a writable app store;
//! metrics, prices, breadth statistics and ticker reference data come from
//! read-only DuckDB stores produced by a separate pipeline. All stores are
//! attached to one in-process DuckDB connection.
//!
//! On top of the stores sit two pure engines:
//! - [`sorting`] orders watchlist items by ticker or by any metric
//! - [`indicators`] computes moving averages, the McClellan summation index
//!   and breadth ratios
//!
//! # Quick start
//!
//! ```no_run
//! use stockwatch::{Dashboard, SortKey, SortDirection, SortSpec};
//!
//! let dash = Dashboard::builder().data_dir("./data").build().unwrap();
//!
//! let spec = SortSpec::new("return_21d".parse::<SortKey>().unwrap(), SortDirection::Desc);
//! let view = dash.sorted_watchlist(1, Some(spec)).unwrap();
//!
//! let chart = dash.price_chart("AAPL", 360).unwrap();
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod config;
pub mod connection;
pub mod error;
pub mod indicators;
pub mod models;
pub mod overlay;
pub mod queries;
pub mod sorting;
pub mod sql_builder;

#[cfg(feature = "async")]
pub use async_client::AsyncDashboard;
pub use config::Store;
pub use connection::Connection;
pub use error::{Result, StockwatchError};
pub use overlay::{compute_overlays, MaConfig, MaLine};
pub use sorting::{parse_default_sort, sort_items, MetricKey, SortDirection, SortKey, SortSpec};
pub use sql_builder::SqlBuilder;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use models::{McClellanChart, PriceChart, SortedWatchlist};

// ---------------------------------------------------------------------------
// DashboardBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`Dashboard`].
///
/// Use [`Dashboard::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](DashboardBuilder::build).
#[derive(Debug, Default, Clone)]
pub struct DashboardBuilder {
    data_dir: Option<PathBuf>,
    store_paths: HashMap<Store, PathBuf>,
    in_memory: bool,
    strict: bool,
}

impl DashboardBuilder {
    /// Directory holding the store files.
    ///
    /// If not set, [`config::default_data_dir`] is used.
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Explicit file for one store, overriding both the data directory and
    /// the store's environment variable.
    pub fn store_path<P: AsRef<Path>>(mut self, store: Store, path: P) -> Self {
        self.store_paths.insert(store, path.as_ref().to_path_buf());
        self
    }

    /// Keep every store in memory. Pipeline stores start empty.
    pub fn in_memory(mut self, in_memory: bool) -> Self {
        self.in_memory = in_memory;
        self
    }

    /// Fail the build when a pipeline store file is missing.
    ///
    /// Defaults to `false`: missing stores are skipped and queries that need
    /// them fail with [`StockwatchError::NotFound`].
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Open the connection and attach every store.
    pub fn build(self) -> Result<Dashboard> {
        let conn = Connection::open_in_memory()?;

        if self.in_memory {
            for store in Store::ALL {
                conn.create_in_memory_store(store)?;
            }
            return Ok(Dashboard { conn });
        }

        let data_dir = self.data_dir.unwrap_or_else(config::default_data_dir);
        for store in Store::ALL {
            let path = match self.store_paths.get(&store) {
                Some(p) => p.clone(),
                None => config::store_path(&data_dir, store),
            };
            match conn.attach(store, &path) {
                Ok(()) => {}
                Err(StockwatchError::NotFound(msg)) if !self.strict => {
                    tracing::warn!(store = store.alias(), "{}", msg);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(Dashboard { conn })
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// The main entry point.
///
/// Owns the [`Connection`] and hands out borrowing query interfaces, plus
/// the composite operations the dashboard renders directly.
pub struct Dashboard {
    conn: Connection,
}

impl Dashboard {
    /// Create a new builder.
    pub fn builder() -> DashboardBuilder {
        DashboardBuilder::default()
    }

    /// Wrap an already configured connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    // -- Query accessors ---------------------------------------------------

    pub fn watchlists(&self) -> queries::WatchlistQuery<'_> {
        queries::WatchlistQuery::new(&self.conn)
    }

    pub fn comments(&self) -> queries::CommentQuery<'_> {
        queries::CommentQuery::new(&self.conn)
    }

    pub fn metrics(&self) -> queries::MetricsQuery<'_> {
        queries::MetricsQuery::new(&self.conn)
    }

    pub fn prices(&self) -> queries::PriceQuery<'_> {
        queries::PriceQuery::new(&self.conn)
    }

    pub fn breadth(&self) -> queries::BreadthQuery<'_> {
        queries::BreadthQuery::new(&self.conn)
    }

    pub fn stocks(&self) -> queries::StockQuery<'_> {
        queries::StockQuery::new(&self.conn)
    }

    pub fn settings(&self) -> queries::SettingsQuery<'_> {
        queries::SettingsQuery::new(&self.conn)
    }

    // -- Composite views ---------------------------------------------------

    /// A watchlist with its items ordered for display.
    ///
    /// `sort` overrides the watchlist's stored default. Metrics are only
    /// loaded when sorting by a metric key; without a metrics store every
    /// value counts as missing.
    pub fn sorted_watchlist(&self, id: i64, sort: Option<SortSpec>) -> Result<Option<SortedWatchlist>> {
        let payload = match self.watchlists().get(id)? {
            Some(p) => p,
            None => return Ok(None),
        };

        let spec = sort.unwrap_or_else(|| parse_default_sort(payload.watchlist.default_sort.as_deref()));
        let lookup = match spec.key {
            SortKey::Metric(_) if self.conn.has_store(Store::Metrics) => {
                self.metrics().lookup_for_watchlist(id)?
            }
            _ => HashMap::new(),
        };

        let items = sorting::sort_by_spec(&payload.items, spec, &lookup);
        let groups = if payload.watchlist.groups_by_subcategory() {
            Some(sorting::group_by_subcategory(&items))
        } else {
            None
        };

        Ok(Some(SortedWatchlist {
            watchlist: payload.watchlist,
            sort: spec,
            sort_key: spec.encode(),
            items,
            groups,
        }))
    }

    /// Price bars of the last `days` days with the stored overlay config applied.
    pub fn price_chart(&self, ticker: &str, days: i64) -> Result<PriceChart> {
        let bars = self.prices().bars(ticker, days)?;
        let config = self.settings().chart_ma_config()?;
        let overlays = compute_overlays(&indicators::close_points(&bars), &config);

        Ok(PriceChart {
            ticker: ticker.trim().to_uppercase(),
            bars,
            overlays,
        })
    }

    /// McClellan oscillator of a group with its summation index.
    ///
    /// The summation and its mean run over the full history; only the last
    /// `window` points are returned (clamped to the available range).
    pub fn mcclellan_chart(&self, group_id: i64, window: usize) -> Result<McClellanChart> {
        let (dates, oscillator) = self.breadth().mcclellan_values(group_id)?;
        let series = indicators::SummationSeries::compute(&oscillator).window(window);

        Ok(McClellanChart {
            group_id,
            total_points: oscillator.len(),
            dates: indicators::tail_window(&dates, window).to_vec(),
            mcclellan: indicators::tail_window(&oscillator, window).to_vec(),
            summation: series.summation,
            ma10: series.ma10,
        })
    }

    // -- Utility -------------------------------------------------------------

    /// Execute a raw SQL query against the attached stores.
    ///
    /// * `query` - SQL string with `?` positional placeholders.
    /// * `params` - Parameter values corresponding to the placeholders.
    pub fn sql(
        &self,
        query: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        self.conn.execute(query, params)
    }

    /// Aliases of the attached stores.
    pub fn stores(&self) -> Vec<String> {
        self.conn.stores()
    }

    /// Return a reference to the underlying [`Connection`] for advanced usage.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dashboard(stores=[{}])", self.conn.stores().join(", "))
    }
}
