use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Json;
use serde::Deserialize;
use stockwatch::models::Comment;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SaveCommentBody {
    pub watchlist_item_id: i64,
    pub box_index: i64,
    #[serde(default)]
    pub text: String,
}

/// GET /api/watchlist-items/:item_id/comments
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<i64>,
) -> Result<Json<Vec<Comment>>, AppError> {
    let comments = state.dash.run(move |d| d.comments().for_item(item_id)).await?;
    Ok(Json(comments))
}

/// POST /api/comments
pub async fn save_comment(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SaveCommentBody>,
) -> Result<Json<Comment>, AppError> {
    let comment = state
        .dash
        .run(move |d| {
            d.comments()
                .upsert(body.watchlist_item_id, body.box_index, &body.text)
        })
        .await?;
    Ok(Json(comment))
}
