use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use serde_json::Value;
use stockwatch::MaConfig;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/settings/chart-ma
pub async fn get_chart_ma(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MaConfig>, AppError> {
    let config = state.dash.run(|d| d.settings().chart_ma_config()).await?;
    Ok(Json(config))
}

/// PUT /api/settings/chart-ma
///
/// Accepts any JSON; invalid fields fall back to their defaults.
pub async fn put_chart_ma(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<MaConfig>, AppError> {
    let config = state
        .dash
        .run(move |d| d.settings().set_chart_ma_config(&body))
        .await?;
    Ok(Json(config))
}
