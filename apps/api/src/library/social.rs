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
use crate::models::social::SocialConnectionRow;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ConnectionListResponse {
    pub success: bool,
    pub connections: Vec<SocialConnectionRow>,
}

/// GET /api/social-connections
pub async fn handle_list_connections(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ConnectionListResponse>, AppError> {
    let connections = state.store.list_social_connections(auth.user_id).await?;
    Ok(Json(ConnectionListResponse {
        success: true,
        connections,
    }))
}

/// DELETE /api/social-connections/:id
pub async fn handle_delete_connection(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !state.store.delete_social_connection(auth.user_id, id).await? {
        return Err(AppError::NotFound("Connection not found".to_string()));
    }
    info!("User {} disconnected social account {id}", auth.user_id);
    Ok(Json(json!({ "success": true })))
}
