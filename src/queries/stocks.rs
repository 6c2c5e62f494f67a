//! Ticker reference lookups against the stocks_lists store.

use crate::config::Store;
use crate::connection::Connection;
use crate::error::Result;
use crate::models::StockInfo;
use crate::sql_builder::SqlBuilder;

pub struct StockQuery<'a> {
    conn: &'a Connection,
}

impl<'a> StockQuery<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Name, sector and industry of a ticker (uppercased before lookup).
    pub fn get(&self, ticker: &str) -> Result<Option<StockInfo>> {
        self.conn.ensure_stores(&[Store::StocksLists])?;

        let upper = ticker.trim().to_uppercase();
        let (sql, params) = SqlBuilder::from_store(Store::StocksLists, "stocks")
            .select(&["id", "ticker", "name", "sector", "industry"])
            .where_eq("UPPER(ticker)", &upper)
            .limit(1)
            .build();
        self.conn.execute_one(&sql, &params)
    }
}
