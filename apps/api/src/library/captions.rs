use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::caption::CaptionRow;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CaptionListResponse {
    pub success: bool,
    pub captions: Vec<CaptionRow>,
}

/// GET /api/captions
pub async fn handle_list_captions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<CaptionListResponse>, AppError> {
    let captions = state.store.list_captions(auth.user_id).await?;
    Ok(Json(CaptionListResponse {
        success: true,
        captions,
    }))
}

/// DELETE /api/captions/:id
pub async fn handle_delete_caption(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !state.store.delete_caption(auth.user_id, id).await? {
        return Err(AppError::NotFound("Caption not found".to_string()));
    }
    info!("User {} deleted caption {id}", auth.user_id);
    Ok(Json(json!({ "success": true })))
}
