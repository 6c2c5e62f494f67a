use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use stockwatch::models::{ItemUpdate, WatchlistItem};

use crate::error::AppError;
use crate::state::AppState;

/// A single `ticker`, or a pasted `tickers` list separated by commas or
/// whitespace.
#[derive(Deserialize)]
pub struct AddItemsBody {
    pub ticker: Option<String>,
    pub tickers: Option<String>,
    pub subcategory: Option<String>,
}

/// POST /api/watchlists/:id/items
pub async fn add_items(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<AddItemsBody>,
) -> Result<(StatusCode, Json<Vec<WatchlistItem>>), AppError> {
    let items = match (body.tickers, body.ticker) {
        (Some(list), _) => {
            let sub = body.subcategory;
            state
                .dash
                .run(move |d| d.watchlists().add_items(id, &list, sub.as_deref()))
                .await?
        }
        (None, Some(ticker)) => {
            let sub = body.subcategory;
            let item = state
                .dash
                .run(move |d| d.watchlists().add_item(id, &ticker, sub.as_deref()))
                .await?;
            vec![item]
        }
        (None, None) => return Err(AppError::bad_request("Missing ticker")),
    };
    Ok((StatusCode::CREATED, Json(items)))
}

/// PATCH /api/watchlist-items/:item_id
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<i64>,
    Json(body): Json<ItemUpdate>,
) -> Result<Json<WatchlistItem>, AppError> {
    state
        .dash
        .run(move |d| d.watchlists().update_item(item_id, &body))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("Watchlist item {item_id} not found")))
}

/// DELETE /api/watchlist-items/:item_id
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if state.dash.run(move |d| d.watchlists().remove_item(item_id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("Watchlist item {item_id} not found")))
    }
}
