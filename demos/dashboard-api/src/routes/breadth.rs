use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::Deserialize;
use stockwatch::config::DEFAULT_MCCLELLAN_WINDOW;
use stockwatch::models::{BreadthRow, GroupBreadth, McClellanChart};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct WindowParams {
    pub window: Option<usize>,
}

/// GET /api/breadth
pub async fn latest(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<GroupBreadth>>, AppError> {
    let rows = state.dash.run(|d| d.breadth().latest_for_groups()).await?;
    Ok(Json(rows))
}

/// GET /api/breadth/:group_id
pub async fn history(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<i64>,
) -> Result<Json<Vec<BreadthRow>>, AppError> {
    let rows = state.dash.run(move |d| d.breadth().history(group_id)).await?;
    Ok(Json(rows))
}

/// GET /api/breadth/:group_id/mcclellan?window=200
pub async fn mcclellan(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<i64>,
    Query(params): Query<WindowParams>,
) -> Result<Json<McClellanChart>, AppError> {
    let window = params.window.unwrap_or(DEFAULT_MCCLELLAN_WINDOW);
    let chart = state
        .dash
        .run(move |d| d.mcclellan_chart(group_id, window))
        .await?;
    Ok(Json(chart))
}
