//! Watchlist and watchlist-item persistence in the app store.

use std::collections::HashSet;

use crate::config::Store;
use crate::connection::Connection;
use crate::error::{Result, StockwatchError};
use crate::models::{ItemUpdate, NewWatchlist, Watchlist, WatchlistItem, WatchlistPayload, WatchlistUpdate};
use crate::sorting::SortSpec;
use crate::sql_builder::SqlBuilder;

use super::{clean_text, next_id};

const WATCHLIST_COLUMNS: &[&str] = &["id", "title", "intro", "default_sort", "group_by_subcategory"];
const ITEM_COLUMNS: &[&str] = &["id AS item_id", "ticker", "subcategory"];

/// Normalize a ticker symbol: trimmed and uppercased.
fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

/// Split a pasted ticker list on commas and whitespace.
///
/// Symbols are normalized and duplicates removed, keeping first appearance.
pub fn parse_ticker_list(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.split(|c: char| c == ',' || c.is_whitespace())
        .map(normalize_ticker)
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// WatchlistQuery
// ---------------------------------------------------------------------------

/// Query interface for watchlists and their items.
pub struct WatchlistQuery<'a> {
    conn: &'a Connection,
}

impl<'a> WatchlistQuery<'a> {
    /// Create a new `WatchlistQuery` bound to the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// All watchlists ordered by id.
    pub fn list(&self) -> Result<Vec<Watchlist>> {
        self.conn.ensure_stores(&[Store::App])?;

        let (sql, params) = SqlBuilder::from_store(Store::App, "watchlists")
            .select(WATCHLIST_COLUMNS)
            .order_by(&["id ASC"])
            .build();
        self.conn.execute_into(&sql, &params)
    }

    /// A watchlist header without its items.
    pub fn header(&self, id: i64) -> Result<Option<Watchlist>> {
        self.conn.ensure_stores(&[Store::App])?;

        let (sql, params) = SqlBuilder::from_store(Store::App, "watchlists")
            .select(WATCHLIST_COLUMNS)
            .where_eq("id", &id.to_string())
            .limit(1)
            .build();
        self.conn.execute_one(&sql, &params)
    }

    /// Items of a watchlist in saved order.
    pub fn items(&self, watchlist_id: i64) -> Result<Vec<WatchlistItem>> {
        self.conn.ensure_stores(&[Store::App])?;

        let (sql, params) = SqlBuilder::from_store(Store::App, "watchlist_items")
            .select(ITEM_COLUMNS)
            .where_eq("watchlist_id", &watchlist_id.to_string())
            .order_by(&["\"position\" ASC", "id ASC"])
            .build();
        self.conn.execute_into(&sql, &params)
    }

    /// A watchlist with its items in saved order.
    pub fn get(&self, id: i64) -> Result<Option<WatchlistPayload>> {
        let watchlist = match self.header(id)? {
            Some(w) => w,
            None => return Ok(None),
        };
        let items = self.items(id)?;
        Ok(Some(WatchlistPayload { watchlist, items }))
    }

    /// Create a watchlist. The title is required.
    pub fn create(&self, new: &NewWatchlist) -> Result<Watchlist> {
        self.conn.ensure_stores(&[Store::App])?;

        let title = clean_text(Some(&new.title))
            .ok_or_else(|| StockwatchError::InvalidArgument("title is required".into()))?;
        let id = next_id(self.conn, "app.watchlists")?;

        self.conn.execute_write(
            "INSERT INTO app.watchlists (id, title, intro, default_sort, group_by_subcategory)
             VALUES (?, ?, NULLIF(?, ''), NULLIF(?, ''), ?)",
            &[
                id.to_string(),
                title,
                clean_text(new.intro.as_deref()).unwrap_or_default(),
                clean_text(new.default_sort.as_deref()).unwrap_or_default(),
                flag(new.group_by_subcategory),
            ],
        )?;
        tracing::info!(watchlist_id = id, "created watchlist");

        self.header(id)?
            .ok_or_else(|| StockwatchError::NotFound(format!("watchlist {} vanished after insert", id)))
    }

    /// Partially update a watchlist header. Returns `None` for an unknown id.
    pub fn update(&self, id: i64, update: &WatchlistUpdate) -> Result<Option<Watchlist>> {
        self.conn.ensure_stores(&[Store::App])?;

        if update.is_empty() {
            return Err(StockwatchError::InvalidArgument("nothing to update".into()));
        }

        let mut sets: Vec<&str> = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(ref title) = update.title {
            let title = clean_text(Some(title))
                .ok_or_else(|| StockwatchError::InvalidArgument("title cannot be blank".into()))?;
            sets.push("title = ?");
            params.push(title);
        }
        if let Some(ref intro) = update.intro {
            sets.push("intro = NULLIF(?, '')");
            params.push(clean_text(Some(intro)).unwrap_or_default());
        }
        if let Some(ref sort) = update.default_sort {
            sets.push("default_sort = NULLIF(?, '')");
            params.push(clean_text(Some(sort)).unwrap_or_default());
        }
        if let Some(grouped) = update.group_by_subcategory {
            sets.push("group_by_subcategory = ?");
            params.push(flag(grouped));
        }

        params.push(id.to_string());
        let changed = self.conn.execute_write(
            &format!("UPDATE app.watchlists SET {} WHERE id = ?", sets.join(", ")),
            &params,
        )?;
        if changed == 0 {
            return Ok(None);
        }
        tracing::debug!(watchlist_id = id, "updated watchlist");
        self.header(id)
    }

    /// Persist the default sort of a watchlist.
    pub fn set_default_sort(&self, id: i64, spec: &SortSpec) -> Result<Option<Watchlist>> {
        self.update(
            id,
            &WatchlistUpdate {
                default_sort: Some(spec.encode()),
                ..Default::default()
            },
        )
    }

    /// Delete a watchlist with its items and their comments.
    pub fn delete(&self, id: i64) -> Result<bool> {
        self.conn.ensure_stores(&[Store::App])?;

        let id_param = [id.to_string()];
        let removed = self.conn.in_transaction(|conn| {
            conn.execute_write(
                "DELETE FROM app.comments WHERE watchlist_item_id IN
                 (SELECT id FROM app.watchlist_items WHERE watchlist_id = ?)",
                &id_param,
            )?;
            conn.execute_write("DELETE FROM app.watchlist_items WHERE watchlist_id = ?", &id_param)?;
            conn.execute_write("DELETE FROM app.watchlists WHERE id = ?", &id_param)
        })?;

        if removed > 0 {
            tracing::info!(watchlist_id = id, "deleted watchlist");
        }
        Ok(removed > 0)
    }

    // -- Items ---------------------------------------------------------------

    /// A single item by id.
    pub fn item(&self, item_id: i64) -> Result<Option<WatchlistItem>> {
        self.conn.ensure_stores(&[Store::App])?;

        let (sql, params) = SqlBuilder::from_store(Store::App, "watchlist_items")
            .select(ITEM_COLUMNS)
            .where_eq("id", &item_id.to_string())
            .limit(1)
            .build();
        self.conn.execute_one(&sql, &params)
    }

    /// Append a ticker to the end of a watchlist's saved order.
    pub fn add_item(
        &self,
        watchlist_id: i64,
        ticker: &str,
        subcategory: Option<&str>,
    ) -> Result<WatchlistItem> {
        self.conn.ensure_stores(&[Store::App])?;

        let ticker = normalize_ticker(ticker);
        if ticker.is_empty() {
            return Err(StockwatchError::InvalidArgument("ticker is required".into()));
        }
        self.require_watchlist(watchlist_id)?;
        self.insert_item(watchlist_id, &ticker, clean_text(subcategory))
    }

    /// Add every ticker of a comma or whitespace separated list, skipping
    /// tickers the watchlist already holds.
    pub fn add_items(
        &self,
        watchlist_id: i64,
        text: &str,
        subcategory: Option<&str>,
    ) -> Result<Vec<WatchlistItem>> {
        self.conn.ensure_stores(&[Store::App])?;
        self.require_watchlist(watchlist_id)?;

        let existing: HashSet<String> = self
            .items(watchlist_id)?
            .into_iter()
            .map(|i| i.ticker.to_uppercase())
            .collect();
        let subcategory = clean_text(subcategory);

        let tickers: Vec<String> = parse_ticker_list(text)
            .into_iter()
            .filter(|t| !existing.contains(t))
            .collect();

        self.conn.in_transaction(|_| {
            tickers
                .iter()
                .map(|t| self.insert_item(watchlist_id, t, subcategory.clone()))
                .collect()
        })
    }

    /// Partially update an item. Returns `None` for an unknown id.
    pub fn update_item(&self, item_id: i64, update: &ItemUpdate) -> Result<Option<WatchlistItem>> {
        self.conn.ensure_stores(&[Store::App])?;

        let mut sets: Vec<&str> = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(ref ticker) = update.ticker {
            let ticker = normalize_ticker(ticker);
            if ticker.is_empty() {
                return Err(StockwatchError::InvalidArgument("ticker cannot be blank".into()));
            }
            sets.push("ticker = ?");
            params.push(ticker);
        }
        if let Some(ref sub) = update.subcategory {
            sets.push("subcategory = NULLIF(?, '')");
            params.push(clean_text(Some(sub)).unwrap_or_default());
        }
        if sets.is_empty() {
            return Err(StockwatchError::InvalidArgument("nothing to update".into()));
        }

        params.push(item_id.to_string());
        let changed = self.conn.execute_write(
            &format!("UPDATE app.watchlist_items SET {} WHERE id = ?", sets.join(", ")),
            &params,
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.item(item_id)
    }

    /// Remove an item and its comments.
    pub fn remove_item(&self, item_id: i64) -> Result<bool> {
        self.conn.ensure_stores(&[Store::App])?;

        let id_param = [item_id.to_string()];
        let removed = self.conn.in_transaction(|conn| {
            conn.execute_write("DELETE FROM app.comments WHERE watchlist_item_id = ?", &id_param)?;
            conn.execute_write("DELETE FROM app.watchlist_items WHERE id = ?", &id_param)
        })?;
        Ok(removed > 0)
    }

    /// Persist a new saved order.
    ///
    /// `item_ids` must name every item of the watchlist exactly once.
    pub fn reorder(&self, watchlist_id: i64, item_ids: &[i64]) -> Result<Vec<WatchlistItem>> {
        self.conn.ensure_stores(&[Store::App])?;
        self.require_watchlist(watchlist_id)?;

        let current: HashSet<i64> = self.items(watchlist_id)?.iter().map(|i| i.item_id).collect();
        let requested: HashSet<i64> = item_ids.iter().copied().collect();
        if requested.len() != item_ids.len() || requested != current {
            return Err(StockwatchError::InvalidArgument(format!(
                "order must list each of the {} items of watchlist {} exactly once",
                current.len(),
                watchlist_id
            )));
        }

        self.conn.in_transaction(|conn| {
            for (position, item_id) in item_ids.iter().enumerate() {
                conn.execute_write(
                    "UPDATE app.watchlist_items SET \"position\" = ? WHERE id = ?",
                    &[position.to_string(), item_id.to_string()],
                )?;
            }
            Ok(())
        })?;
        tracing::debug!(watchlist_id, items = item_ids.len(), "reordered watchlist");

        self.items(watchlist_id)
    }

    fn require_watchlist(&self, watchlist_id: i64) -> Result<Watchlist> {
        self.header(watchlist_id)?
            .ok_or_else(|| StockwatchError::NotFound(format!("watchlist {} not found", watchlist_id)))
    }

    fn insert_item(
        &self,
        watchlist_id: i64,
        ticker: &str,
        subcategory: Option<String>,
    ) -> Result<WatchlistItem> {
        let id = next_id(self.conn, "app.watchlist_items")?;
        let position = self
            .conn
            .execute_scalar(
                "SELECT COALESCE(MAX(\"position\"), -1) + 1 FROM app.watchlist_items WHERE watchlist_id = ?",
                &[watchlist_id.to_string()],
            )?
            .and_then(|v| v.as_i64())
            .unwrap_or(0);

        self.conn.execute_write(
            "INSERT INTO app.watchlist_items (id, watchlist_id, ticker, subcategory, \"position\")
             VALUES (?, ?, ?, NULLIF(?, ''), ?)",
            &[
                id.to_string(),
                watchlist_id.to_string(),
                ticker.to_string(),
                subcategory.clone().unwrap_or_default(),
                position.to_string(),
            ],
        )?;
        tracing::debug!(watchlist_id, item_id = id, ticker, "added watchlist item");

        Ok(WatchlistItem {
            item_id: id,
            ticker: ticker.to_string(),
            subcategory,
        })
    }
}

fn flag(value: bool) -> String {
    let v = if value { "1" } else { "0" };
    v.to_string()
}
