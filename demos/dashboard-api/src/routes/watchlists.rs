use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use stockwatch::models::{NewWatchlist, SortedWatchlist, Watchlist, WatchlistItem, WatchlistUpdate};
use stockwatch::{parse_default_sort, SortDirection, SortKey, SortSpec};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SortParams {
    pub sort: Option<String>,
}

#[derive(Deserialize)]
pub struct ReorderBody {
    pub item_ids: Vec<i64>,
}

/// Either an encoded sort (`{"sort": "return_21d_desc"}`) or its parts.
#[derive(Deserialize)]
pub struct SortBody {
    pub sort: Option<String>,
    pub key: Option<String>,
    pub direction: Option<String>,
}

impl SortBody {
    fn resolve(self) -> Result<SortSpec, AppError> {
        if let Some(encoded) = self.sort {
            return Ok(parse_default_sort(Some(&encoded)));
        }
        let key_str = self
            .key
            .ok_or_else(|| AppError::bad_request("Missing sort key"))?;
        let key = key_str
            .parse::<SortKey>()
            .map_err(|_| AppError::bad_request(format!("Unknown sort key: {key_str}")))?;
        let direction = match self.direction.as_deref() {
            None => SortDirection::Desc,
            Some(d) => SortDirection::parse(d)
                .ok_or_else(|| AppError::bad_request(format!("Unknown sort direction: {d}")))?,
        };
        Ok(SortSpec::new(key, direction))
    }
}

/// GET /api/watchlists
pub async fn list_watchlists(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Watchlist>>, AppError> {
    let lists = state.dash.run(|d| d.watchlists().list()).await?;
    Ok(Json(lists))
}

/// POST /api/watchlists
pub async fn create_watchlist(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewWatchlist>,
) -> Result<(StatusCode, Json<Watchlist>), AppError> {
    let created = state.dash.run(move |d| d.watchlists().create(&body)).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/watchlists/:id?sort=ticker_asc
///
/// Items come back in the requested order, or the watchlist's stored
/// default when `sort` is absent.
pub async fn get_watchlist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<SortParams>,
) -> Result<Json<SortedWatchlist>, AppError> {
    let sort = params.sort.map(|s| parse_default_sort(Some(&s)));
    state
        .dash
        .run(move |d| d.sorted_watchlist(id, sort))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("Watchlist {id} not found")))
}

/// PATCH /api/watchlists/:id
pub async fn update_watchlist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<WatchlistUpdate>,
) -> Result<Json<Watchlist>, AppError> {
    state
        .dash
        .run(move |d| d.watchlists().update(id, &body))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("Watchlist {id} not found")))
}

/// DELETE /api/watchlists/:id
pub async fn delete_watchlist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if state.dash.run(move |d| d.watchlists().delete(id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("Watchlist {id} not found")))
    }
}

/// PUT /api/watchlists/:id/order
pub async fn reorder_items(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<ReorderBody>,
) -> Result<Json<Vec<WatchlistItem>>, AppError> {
    let items = state
        .dash
        .run(move |d| d.watchlists().reorder(id, &body.item_ids))
        .await?;
    Ok(Json(items))
}

/// PUT /api/watchlists/:id/sort
pub async fn set_sort(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<SortBody>,
) -> Result<Json<Watchlist>, AppError> {
    let spec = body.resolve()?;
    state
        .dash
        .run(move |d| d.watchlists().set_default_sort(id, &spec))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("Watchlist {id} not found")))
}
