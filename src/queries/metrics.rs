//! Latest-snapshot metric queries against the metrics store.

use std::collections::HashMap;

use crate::config::Store;
use crate::connection::Connection;
use crate::error::Result;
use crate::models::MetricsRow;
use crate::sorting::{metrics_by_symbol, MetricKey};
use crate::sql_builder::SqlBuilder;

use super::watchlists::WatchlistQuery;

/// Query interface for the `metrics.metrics` table.
///
/// Every lookup reads the snapshot at the latest date present in the table,
/// shared by all symbols.
pub struct MetricsQuery<'a> {
    conn: &'a Connection,
}

impl<'a> MetricsQuery<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn columns() -> Vec<&'static str> {
        let mut cols = vec!["symbol", "date"];
        cols.extend(MetricKey::ALL.iter().map(|k| k.as_str()));
        cols
    }

    /// Latest snapshot date, if the table has any rows.
    pub fn latest_date(&self) -> Result<Option<String>> {
        self.conn.ensure_stores(&[Store::Metrics])?;

        let value = self
            .conn
            .execute_scalar("SELECT MAX(date) FROM metrics.metrics", &[])?;
        Ok(value.and_then(|v| v.as_str().map(|s| s.to_string())))
    }

    /// Latest metrics of one ticker.
    pub fn for_ticker(&self, ticker: &str) -> Result<Option<MetricsRow>> {
        let date = match self.latest_date()? {
            Some(d) => d,
            None => return Ok(None),
        };

        let (sql, params) = SqlBuilder::from_store(Store::Metrics, "metrics")
            .select(&Self::columns())
            .where_eq("symbol", ticker.trim())
            .where_eq("date", &date)
            .limit(1)
            .build();
        self.conn.execute_one(&sql, &params)
    }

    /// Latest metrics of several tickers, ordered by symbol. Tickers without
    /// a row are absent from the result.
    pub fn for_tickers(&self, tickers: &[&str]) -> Result<Vec<MetricsRow>> {
        if tickers.is_empty() {
            return Ok(Vec::new());
        }
        let date = match self.latest_date()? {
            Some(d) => d,
            None => return Ok(Vec::new()),
        };

        let (sql, params) = SqlBuilder::from_store(Store::Metrics, "metrics")
            .select(&Self::columns())
            .where_eq("date", &date)
            .where_in("symbol", tickers)
            .order_by(&["symbol ASC"])
            .build();
        self.conn.execute_into(&sql, &params)
    }

    /// Latest metrics for every ticker of a watchlist.
    pub fn for_watchlist(&self, watchlist_id: i64) -> Result<Vec<MetricsRow>> {
        let items = WatchlistQuery::new(self.conn).items(watchlist_id)?;
        let tickers: Vec<&str> = items.iter().map(|i| i.ticker.as_str()).collect();
        self.for_tickers(&tickers)
    }

    /// Watchlist metrics keyed by symbol, ready for the sort engine.
    pub fn lookup_for_watchlist(&self, watchlist_id: i64) -> Result<HashMap<String, MetricsRow>> {
        Ok(metrics_by_symbol(self.for_watchlist(watchlist_id)?))
    }
}
