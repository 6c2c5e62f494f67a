//! Async wrapper around [`Dashboard`] for use in async runtimes (Tokio, etc.).
//!
//! Runs all operations on a blocking thread pool via
//! [`tokio::task::spawn_blocking`], keeping the async event loop free.
//!
//! # Example
//!
//! ```no_run
//! use stockwatch::AsyncDashboard;
//!
//! #[tokio::main]
//! async fn main() {
//!     let dash = AsyncDashboard::builder().build().await.unwrap();
//!
//!     // Run any sync method via closure
//!     let lists = dash.run(|d| d.watchlists().list()).await.unwrap();
//!
//!     let rows = dash.sql("SELECT COUNT(*) FROM metrics.metrics", &[]).await.unwrap();
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::Store;
use crate::error::{Result, StockwatchError};
use crate::{Dashboard, DashboardBuilder};

// ---------------------------------------------------------------------------
// AsyncDashboardBuilder
// ---------------------------------------------------------------------------

/// Builder for an [`AsyncDashboard`]; mirrors [`DashboardBuilder`].
#[derive(Debug, Default, Clone)]
pub struct AsyncDashboardBuilder {
    inner: DashboardBuilder,
}

impl AsyncDashboardBuilder {
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.inner = self.inner.data_dir(path);
        self
    }

    pub fn store_path<P: AsRef<Path>>(mut self, store: Store, path: P) -> Self {
        self.inner = self.inner.store_path(store, path);
        self
    }

    pub fn in_memory(mut self, in_memory: bool) -> Self {
        self.inner = self.inner.in_memory(in_memory);
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.inner = self.inner.strict(strict);
        self
    }

    /// Build the dashboard on the blocking thread pool.
    pub async fn build(self) -> Result<AsyncDashboard> {
        let builder = self.inner;
        tokio::task::spawn_blocking(move || {
            let dash = builder.build()?;
            Ok(AsyncDashboard {
                inner: Arc::new(Mutex::new(dash)),
            })
        })
        .await
        .map_err(|e| StockwatchError::Internal(format!("Task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// AsyncDashboard
// ---------------------------------------------------------------------------

/// Async wrapper around [`Dashboard`].
///
/// The underlying [`Dashboard`] is protected by a [`Mutex`] since its
/// connection uses `RefCell` internally. Cloning shares the same dashboard.
#[derive(Clone)]
pub struct AsyncDashboard {
    inner: Arc<Mutex<Dashboard>>,
}

impl AsyncDashboard {
    pub fn builder() -> AsyncDashboardBuilder {
        AsyncDashboardBuilder::default()
    }

    /// Wrap an existing dashboard.
    pub fn new(dash: Dashboard) -> Self {
        Self {
            inner: Arc::new(Mutex::new(dash)),
        }
    }

    /// Run a sync operation on the blocking thread pool.
    ///
    /// The closure receives a `&Dashboard` and should return a `Result<T>`.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Dashboard) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let dash = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            // Recover the dashboard after a panic in an earlier call.
            let guard = dash.lock().unwrap_or_else(PoisonError::into_inner);
            f(&guard)
        })
        .await
        .map_err(|e| StockwatchError::Internal(format!("Task join error: {e}")))?
    }

    /// Execute a raw SQL query asynchronously.
    pub async fn sql(
        &self,
        query: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        let query = query.to_string();
        let params = params.to_vec();
        self.run(move |d| d.sql(&query, &params)).await
    }

    /// Aliases of the attached stores.
    pub async fn stores(&self) -> Result<Vec<String>> {
        self.run(|d| Ok(d.stores())).await
    }
}
