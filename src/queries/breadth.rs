//! Market breadth queries against the breadth store.

use crate::config::Store;
use crate::connection::Connection;
use crate::error::Result;
use crate::models::{BreadthRow, GroupBreadth};
use crate::sql_builder::SqlBuilder;

/// Breadth columns aliased to the field names of [`BreadthRow`].
const BREADTH_COLUMNS: &[&str] = &[
    "b.date AS date",
    "b.total AS total",
    "b.adv AS adv",
    "b.\"dec\" AS \"dec\"",
    "b.new_high_52w AS \"newHigh52w\"",
    "b.new_low_52w AS \"newLow52w\"",
    "b.above_ma5 AS \"aboveMa5\"",
    "b.above_ma10 AS \"aboveMa10\"",
    "b.above_ma20 AS \"aboveMa20\"",
    "b.above_ma50 AS \"aboveMa50\"",
    "b.above_ma200 AS \"aboveMa200\"",
    "b.spike_up AS \"spikeUp\"",
    "b.spike_down AS \"spikeDown\"",
    "b.mcclellan AS mcclellan",
];

/// Query interface for per-group breadth statistics.
pub struct BreadthQuery<'a> {
    conn: &'a Connection,
}

impl<'a> BreadthQuery<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Full history of one group, oldest first.
    pub fn history(&self, group_id: i64) -> Result<Vec<BreadthRow>> {
        self.conn.ensure_stores(&[Store::Breadth])?;

        let (sql, params) = SqlBuilder::from_store(Store::Breadth, "breadth b")
            .select(BREADTH_COLUMNS)
            .where_eq("b.group_id", &group_id.to_string())
            .order_by(&["b.date ASC"])
            .build();
        self.conn.execute_into(&sql, &params)
    }

    /// Every group's row at the latest breadth date, ordered by group type
    /// then name. Empty when the table is empty.
    pub fn latest_for_groups(&self) -> Result<Vec<GroupBreadth>> {
        self.conn.ensure_stores(&[Store::Breadth])?;

        let latest = self
            .conn
            .execute_scalar("SELECT MAX(date) FROM breadth.breadth", &[])?
            .and_then(|v| v.as_str().map(|s| s.to_string()));
        let latest = match latest {
            Some(d) => d,
            None => return Ok(Vec::new()),
        };

        let mut cols = vec![
            "g.id AS \"groupId\"",
            "g.name AS \"groupName\"",
            "g.\"type\" AS \"groupType\"",
        ];
        cols.extend_from_slice(BREADTH_COLUMNS);

        let (sql, params) = SqlBuilder::from_store(Store::Breadth, "breadth b")
            .select(&cols)
            .join("JOIN breadth.groups g ON g.id = b.group_id")
            .where_eq("b.date", &latest)
            .order_by(&["g.\"type\" ASC", "g.name ASC"])
            .build();
        self.conn.execute_into(&sql, &params)
    }

    /// Rows of one group that carry a McClellan oscillator value, oldest first.
    pub fn mcclellan_series(&self, group_id: i64) -> Result<Vec<BreadthRow>> {
        self.conn.ensure_stores(&[Store::Breadth])?;

        let (sql, params) = SqlBuilder::from_store(Store::Breadth, "breadth b")
            .select(BREADTH_COLUMNS)
            .where_eq("b.group_id", &group_id.to_string())
            .where_not_null("b.mcclellan")
            .order_by(&["b.date ASC"])
            .build();
        self.conn.execute_into(&sql, &params)
    }

    /// Oscillator values of [`mcclellan_series`](Self::mcclellan_series) with their dates.
    pub fn mcclellan_values(&self, group_id: i64) -> Result<(Vec<String>, Vec<f64>)> {
        let rows = self.mcclellan_series(group_id)?;
        Ok(rows
            .into_iter()
            .filter_map(|r| r.mcclellan.map(|v| (r.date, v)))
            .unzip())
    }
}
