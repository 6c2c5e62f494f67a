//! Query modules for the dashboard stores.
//!
//! Each module provides a query struct that borrows a
//! [`Connection`](crate::connection::Connection), checks that the stores it
//! reads are attached, and returns typed rows from the [`models`](crate::models).

pub mod breadth;
pub mod comments;
pub mod metrics;
pub mod prices;
pub mod settings;
pub mod stocks;
pub mod watchlists;

pub use breadth::BreadthQuery;
pub use comments::CommentQuery;
pub use metrics::MetricsQuery;
pub use prices::PriceQuery;
pub use settings::SettingsQuery;
pub use stocks::StockQuery;
pub use watchlists::WatchlistQuery;

/// Trim a free-text field, mapping blank input to `None`.
pub(crate) fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Next free id of a store table. DuckDB stores are not auto-incremented.
pub(crate) fn next_id(conn: &crate::connection::Connection, table: &str) -> crate::error::Result<i64> {
    let value = conn.execute_scalar(
        &format!("SELECT COALESCE(MAX(id), 0) + 1 FROM {}", table),
        &[],
    )?;
    Ok(value.and_then(|v| v.as_i64()).unwrap_or(1))
}
