//! Axum route handlers for the Generation API.

use axum::{extract::State, Json};

use crate::auth::AuthUser;
use crate::errors::{AppError, AppJson};
use crate::generation::generator::{
    CaptionJob, GenerateCaptionRequest, GenerateCaptionResponse, GenerateVisionRequest,
};
use crate::limits::Bucket;
use crate::state::AppState;

/// POST /api/generate-caption
///
/// Caption from a text description. Quota is charged only on success.
pub async fn handle_generate_caption(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(request): AppJson<GenerateCaptionRequest>,
) -> Result<Json<GenerateCaptionResponse>, AppError> {
    let job = CaptionJob::from_text(auth.user_id, request)?;
    state
        .limiter
        .check(Bucket::CaptionGeneration, auth.user_id)
        .await?;

    let response = state.caption_generator().generate(job).await?;
    Ok(Json(response))
}

/// POST /api/generate-caption-vision
///
/// Caption from an uploaded image (base64, at most 4 MiB decoded).
pub async fn handle_generate_caption_vision(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(request): AppJson<GenerateVisionRequest>,
) -> Result<Json<GenerateCaptionResponse>, AppError> {
    let job = CaptionJob::from_image(auth.user_id, request)?;
    state
        .limiter
        .check(Bucket::CaptionGeneration, auth.user_id)
        .await?;

    let response = state.caption_generator().generate(job).await?;
    Ok(Json(response))
}
