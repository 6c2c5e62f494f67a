//! Parameterized SELECT construction over the attached stores.
//!
//! Queries name their source as `<store>.<table>` so they run the same way
//! whether the store is a SQLite file, a DuckDB file or an in-memory schema.
//! Values are always bound as `?` parameters.
//!
//! ```rust
//! use stockwatch::{SqlBuilder, Store};
//! let (sql, params) = SqlBuilder::from_store(Store::Stocks, "prices")
//!     .select(&["date AS time", "close"])
//!     .where_eq("symbol", "AAPL")
//!     .where_gte("date", "2024-01-01")
//!     .order_by(&["date ASC"])
//!     .build();
//! assert!(sql.starts_with("SELECT date AS time, close\nFROM stocks.prices"));
//! assert_eq!(params, vec!["AAPL", "2024-01-01"]);
//! ```

use crate::config::Store;

/// SELECT builder; every method returns `&mut Self`.
pub struct SqlBuilder {
    select_cols: Vec<String>,
    from_table: String,
    joins: Vec<String>,
    where_clauses: Vec<String>,
    params: Vec<String>,
    order_by_cols: Vec<String>,
    limit_val: Option<usize>,
}

impl SqlBuilder {
    /// Select from a store table. `table` may carry an alias (`"breadth b"`).
    pub fn from_store(store: Store, table: &str) -> Self {
        Self::new(&format!("{}.{}", store.alias(), table))
    }

    /// Select from an arbitrary, already qualified source.
    pub fn new(table: &str) -> Self {
        Self {
            select_cols: vec!["*".to_string()],
            from_table: table.to_string(),
            joins: Vec::new(),
            where_clauses: Vec::new(),
            params: Vec::new(),
            order_by_cols: Vec::new(),
            limit_val: None,
        }
    }

    /// Set the columns to select (replaces the default `*`).
    pub fn select(&mut self, cols: &[&str]) -> &mut Self {
        self.select_cols = cols.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Add a JOIN clause, e.g. `"JOIN breadth.groups g ON g.id = b.group_id"`.
    pub fn join(&mut self, clause: &str) -> &mut Self {
        self.joins.push(clause.to_string());
        self
    }

    /// Add a WHERE condition with `?` placeholders for each param.
    pub fn where_clause(&mut self, condition: &str, params: &[&str]) -> &mut Self {
        self.where_clauses.push(condition.to_string());
        self.params.extend(params.iter().map(|p| p.to_string()));
        self
    }

    /// Add an equality condition: `{column} = ?`.
    pub fn where_eq(&mut self, column: &str, value: &str) -> &mut Self {
        self.where_clauses.push(format!("{} = ?", column));
        self.params.push(value.to_string());
        self
    }

    /// Add an IN condition with parameterized values.
    ///
    /// Empty values list produces `FALSE`.
    pub fn where_in(&mut self, column: &str, values: &[&str]) -> &mut Self {
        if values.is_empty() {
            self.where_clauses.push("FALSE".to_string());
            return self;
        }
        let placeholders: Vec<&str> = values.iter().map(|_| "?").collect();
        self.where_clauses
            .push(format!("{} IN ({})", column, placeholders.join(", ")));
        self.params.extend(values.iter().map(|v| v.to_string()));
        self
    }

    /// Add a greater-than-or-equal condition: `{column} >= ?`.
    pub fn where_gte(&mut self, column: &str, value: &str) -> &mut Self {
        self.where_clauses.push(format!("{} >= ?", column));
        self.params.push(value.to_string());
        self
    }

    /// Add a NOT NULL condition on a column.
    pub fn where_not_null(&mut self, column: &str) -> &mut Self {
        self.where_clauses.push(format!("{} IS NOT NULL", column));
        self
    }

    /// Add ORDER BY clauses (e.g. `"symbol ASC"`, `"date DESC"`).
    pub fn order_by(&mut self, clauses: &[&str]) -> &mut Self {
        self.order_by_cols
            .extend(clauses.iter().map(|c| c.to_string()));
        self
    }

    /// Set the maximum number of rows to return.
    pub fn limit(&mut self, n: usize) -> &mut Self {
        self.limit_val = Some(n);
        self
    }

    /// Build the final SQL string and parameter list.
    pub fn build(&self) -> (String, Vec<String>) {
        let mut parts = vec![
            format!("SELECT {}", self.select_cols.join(", ")),
            format!("FROM {}", self.from_table),
        ];

        for j in &self.joins {
            parts.push(j.clone());
        }

        if !self.where_clauses.is_empty() {
            parts.push(format!("WHERE {}", self.where_clauses.join(" AND ")));
        }

        if !self.order_by_cols.is_empty() {
            parts.push(format!("ORDER BY {}", self.order_by_cols.join(", ")));
        }

        if let Some(n) = self.limit_val {
            parts.push(format!("LIMIT {}", n));
        }

        (parts.join("\n"), self.params.clone())
    }
}
