//! Per-item comment boxes in the app store.

use crate::config::Store;
use crate::connection::{now_timestamp, Connection};
use crate::error::{Result, StockwatchError};
use crate::models::Comment;
use crate::sql_builder::SqlBuilder;

use super::next_id;

/// Comment box indices available on every item.
pub const COMMENT_BOXES: [i64; 2] = [1, 2];

/// Query interface for the two comment boxes attached to each watchlist item.
pub struct CommentQuery<'a> {
    conn: &'a Connection,
}

impl<'a> CommentQuery<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Comments of an item ordered by box index.
    pub fn for_item(&self, item_id: i64) -> Result<Vec<Comment>> {
        self.conn.ensure_stores(&[Store::App])?;

        let (sql, params) = SqlBuilder::from_store(Store::App, "comments")
            .select(&["box_index", "text", "updated_at"])
            .where_eq("watchlist_item_id", &item_id.to_string())
            .order_by(&["box_index ASC"])
            .build();
        self.conn.execute_into(&sql, &params)
    }

    /// Write the text of one comment box, creating it if needed.
    pub fn upsert(&self, item_id: i64, box_index: i64, text: &str) -> Result<Comment> {
        self.conn.ensure_stores(&[Store::App])?;

        if !COMMENT_BOXES.contains(&box_index) {
            return Err(StockwatchError::InvalidArgument(format!(
                "box_index must be 1 or 2, got {}",
                box_index
            )));
        }

        let item_exists = self
            .conn
            .execute_scalar(
                "SELECT COUNT(*) FROM app.watchlist_items WHERE id = ?",
                &[item_id.to_string()],
            )?
            .and_then(|v| v.as_i64())
            .unwrap_or(0)
            > 0;
        if !item_exists {
            return Err(StockwatchError::NotFound(format!("watchlist item {} not found", item_id)));
        }

        let updated_at = now_timestamp();
        let changed = self.conn.execute_write(
            "UPDATE app.comments SET text = ?, updated_at = ?
             WHERE watchlist_item_id = ? AND box_index = ?",
            &[
                text.to_string(),
                updated_at.clone(),
                item_id.to_string(),
                box_index.to_string(),
            ],
        )?;

        if changed == 0 {
            let id = next_id(self.conn, "app.comments")?;
            self.conn.execute_write(
                "INSERT INTO app.comments (id, watchlist_item_id, box_index, text, updated_at)
                 VALUES (?, ?, ?, ?, ?)",
                &[
                    id.to_string(),
                    item_id.to_string(),
                    box_index.to_string(),
                    text.to_string(),
                    updated_at.clone(),
                ],
            )?;
        }
        tracing::debug!(item_id, box_index, "saved comment");

        Ok(Comment {
            box_index,
            text: text.to_string(),
            updated_at: Some(updated_at),
        })
    }
}
