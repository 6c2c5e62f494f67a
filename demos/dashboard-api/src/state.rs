/// Shared application state available to all route handlers via Axum's
/// `State` extractor.
pub struct AppState {
    /// Dispatches blocking store operations to a thread pool internally.
    pub dash: stockwatch::AsyncDashboard,
}
