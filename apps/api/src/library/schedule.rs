//! Scheduling overlay: marks an owned caption for publication at a future
//! time on one or more platforms. Publishing itself happens elsewhere.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::billing::tier::{self, Feature};
use crate::errors::{AppError, AppJson};
use crate::generation::generator::load_user;
use crate::generation::platform::{normalize_platforms, platform_names, Platform};
use crate::models::caption::{CaptionRow, ScheduleStatus};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePostRequest {
    pub caption_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub publish_platforms: Vec<Platform>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledPost {
    pub id: Uuid,
    pub content: String,
    pub scheduled_at: DateTime<Utc>,
    pub platforms: Vec<String>,
    pub status: ScheduleStatus,
}

#[derive(Debug, Serialize)]
pub struct SchedulePostResponse {
    pub success: bool,
    pub scheduled: ScheduledPost,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    #[serde(default)]
    pub status: ScheduleStatus,
}

#[derive(Debug, Serialize)]
pub struct ScheduledListResponse {
    pub success: bool,
    pub captions: Vec<CaptionRow>,
}

/// POST /api/schedule-post
///
/// A past time is rejected for every tier, before the tier gate.
pub async fn handle_schedule_post(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(request): AppJson<SchedulePostRequest>,
) -> Result<Json<SchedulePostResponse>, AppError> {
    if request.scheduled_at <= Utc::now() {
        return Err(AppError::Validation(
            "Scheduled time must be in the future".to_string(),
        ));
    }
    let platforms = normalize_platforms("publishPlatforms", &request.publish_platforms)
        .map_err(AppError::Validation)?;

    let user = load_user(state.store.as_ref(), auth.user_id).await?;
    tier::require(user.tier(), Feature::Scheduling)?;

    let names = platform_names(&platforms);
    let caption = state
        .store
        .schedule_caption(auth.user_id, request.caption_id, request.scheduled_at, &names)
        .await?
        .ok_or_else(|| AppError::NotFound("Caption not found".to_string()))?;

    info!(
        "User {} scheduled caption {} for {}",
        auth.user_id, caption.id, request.scheduled_at
    );

    Ok(Json(SchedulePostResponse {
        success: true,
        scheduled: ScheduledPost {
            id: caption.id,
            content: caption.content,
            scheduled_at: request.scheduled_at,
            platforms: names,
            status: ScheduleStatus::Scheduled,
        },
    }))
}

/// GET /api/schedule-post?status=
pub async fn handle_list_scheduled(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<ScheduledListResponse>, AppError> {
    let captions = state.store.list_scheduled(auth.user_id, query.status).await?;
    Ok(Json(ScheduledListResponse {
        success: true,
        captions,
    }))
}
