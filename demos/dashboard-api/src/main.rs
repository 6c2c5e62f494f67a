mod error;
mod routes;
mod state;

use std::sync::Arc;

use axum::routing::{get, patch, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;

use state::AppState;

const ADDR_ENV: &str = "STOCKWATCH_ADDR";
const DEFAULT_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let dash = stockwatch::AsyncDashboard::builder().build().await?;
    tracing::info!(stores = ?dash.stores().await?, "dashboard ready");

    let state = Arc::new(AppState { dash });

    let app = Router::new()
        .route(
            "/api/watchlists",
            get(routes::watchlists::list_watchlists).post(routes::watchlists::create_watchlist),
        )
        .route(
            "/api/watchlists/{id}",
            get(routes::watchlists::get_watchlist)
                .patch(routes::watchlists::update_watchlist)
                .delete(routes::watchlists::delete_watchlist),
        )
        .route("/api/watchlists/{id}/order", put(routes::watchlists::reorder_items))
        .route("/api/watchlists/{id}/sort", put(routes::watchlists::set_sort))
        .route("/api/watchlists/{id}/items", post(routes::items::add_items))
        .route("/api/watchlists/{id}/metrics", get(routes::market::watchlist_metrics))
        .route(
            "/api/watchlist-items/{item_id}",
            patch(routes::items::update_item).delete(routes::items::delete_item),
        )
        .route(
            "/api/watchlist-items/{item_id}/comments",
            get(routes::comments::list_comments),
        )
        .route("/api/comments", post(routes::comments::save_comment))
        .route("/api/metrics", get(routes::market::ticker_metrics))
        .route("/api/ohlc", get(routes::market::ohlc))
        .route("/api/stocks/{ticker}", get(routes::market::stock_info))
        .route(
            "/api/settings/chart-ma",
            get(routes::settings::get_chart_ma).put(routes::settings::put_chart_ma),
        )
        .route("/api/breadth", get(routes::breadth::latest))
        .route("/api/breadth/{group_id}", get(routes::breadth::history))
        .route("/api/breadth/{group_id}/mcclellan", get(routes::breadth::mcclellan))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = std::env::var(ADDR_ENV).unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    tracing::info!("Listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
