use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use stockwatch::config::DEFAULT_OHLC_DAYS;
use stockwatch::models::{MetricsRow, PriceChart, StockInfo};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct TickerParams {
    pub ticker: Option<String>,
}

#[derive(Deserialize)]
pub struct OhlcParams {
    pub ticker: Option<String>,
    pub days: Option<i64>,
}

/// GET /api/metrics?ticker=AAPL
///
/// Latest metrics row for the ticker, or `{}` when it has none.
pub async fn ticker_metrics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TickerParams>,
) -> Result<Json<Value>, AppError> {
    let ticker = params
        .ticker
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("Missing ticker"))?;

    let row = state.dash.run(move |d| d.metrics().for_ticker(&ticker)).await?;
    let body = match row {
        Some(r) => serde_json::to_value(r).map_err(|e| AppError::internal(e.to_string()))?,
        None => json!({}),
    };
    Ok(Json(body))
}

/// GET /api/watchlists/:id/metrics
pub async fn watchlist_metrics(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<MetricsRow>>, AppError> {
    let rows = state.dash.run(move |d| d.metrics().for_watchlist(id)).await?;
    Ok(Json(rows))
}

/// GET /api/ohlc?ticker=AAPL&days=360
///
/// Daily bars plus the moving-average overlays of the stored chart config.
pub async fn ohlc(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OhlcParams>,
) -> Result<Json<PriceChart>, AppError> {
    let ticker = params
        .ticker
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("Missing ticker"))?;
    let days = params.days.unwrap_or(DEFAULT_OHLC_DAYS);

    let chart = state
        .dash
        .run(move |d| d.price_chart(&ticker, days))
        .await?;
    Ok(Json(chart))
}

/// GET /api/stocks/:ticker
pub async fn stock_info(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
) -> Result<Json<StockInfo>, AppError> {
    let lookup = ticker.clone();
    state
        .dash
        .run(move |d| d.stocks().get(&lookup))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("Ticker {ticker} not found")))
}
