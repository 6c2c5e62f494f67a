//! Daily OHLC price queries against the stocks store.

use chrono::{Duration, Utc};

use crate::config::{Store, MAX_OHLC_DAYS};
use crate::connection::Connection;
use crate::error::{Result, StockwatchError};
use crate::models::OhlcBar;
use crate::sql_builder::SqlBuilder;

// ---------------------------------------------------------------------------
// PriceQuery
// ---------------------------------------------------------------------------

/// Query interface for daily price bars backed by `stocks.prices`.
pub struct PriceQuery<'a> {
    conn: &'a Connection,
}

impl<'a> PriceQuery<'a> {
    /// Create a new `PriceQuery` bound to the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Bars of the last `days` calendar days, oldest first.
    ///
    /// `days` must be within `1..=10000`. The ticker is uppercased before lookup.
    pub fn bars(&self, ticker: &str, days: i64) -> Result<Vec<OhlcBar>> {
        if !(1..=MAX_OHLC_DAYS).contains(&days) {
            return Err(StockwatchError::InvalidArgument(format!(
                "days must be between 1 and {}, got {}",
                MAX_OHLC_DAYS, days
            )));
        }

        let cutoff = (Utc::now().date_naive() - Duration::days(days))
            .format("%Y-%m-%d")
            .to_string();
        self.bars_since(ticker, &cutoff)
    }

    /// Bars dated on or after `since` (`YYYY-MM-DD`), oldest first.
    pub fn bars_since(&self, ticker: &str, since: &str) -> Result<Vec<OhlcBar>> {
        self.conn.ensure_stores(&[Store::Stocks])?;

        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(StockwatchError::InvalidArgument("ticker is required".into()));
        }

        let (sql, params) = SqlBuilder::from_store(Store::Stocks, "prices")
            .select(&["date AS time", "open", "high", "low", "close", "volume"])
            .where_eq("symbol", &ticker)
            .where_gte("date", since)
            .order_by(&["date ASC"])
            .build();
        self.conn.execute_into(&sql, &params)
    }
}
