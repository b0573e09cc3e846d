//! Brand voice: up to five example captions plus a preferred tone, used as
//! style references at generation time.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::AuthUser;
use crate::billing::tier::{self, Feature};
use crate::errors::{AppError, AppJson};
use crate::generation::generator::load_user;
use crate::generation::tone::Tone;
use crate::models::brand_voice::BrandVoiceRow;
use crate::state::AppState;

pub const MAX_EXAMPLES: usize = 5;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveBrandVoiceRequest {
    pub examples: Vec<String>,
    pub selected_tone: Tone,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandVoiceResponse {
    pub success: bool,
    pub brand_voice: Option<BrandVoiceRow>,
}

/// Trims each example and rejects blanks. The list must hold 1..=5 entries.
pub fn validate_examples(examples: &[String]) -> Result<Vec<String>, AppError> {
    if examples.is_empty() || examples.len() > MAX_EXAMPLES {
        return Err(AppError::Validation(format!(
            "examples must contain between 1 and {MAX_EXAMPLES} captions"
        )));
    }
    examples
        .iter()
        .map(|e| {
            let e = e.trim();
            if e.is_empty() {
                Err(AppError::Validation("examples must not be blank".to_string()))
            } else {
                Ok(e.to_string())
            }
        })
        .collect()
}

/// GET /api/brand-voices
pub async fn handle_get_brand_voice(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<BrandVoiceResponse>, AppError> {
    let brand_voice = state.store.get_brand_voice(auth.user_id).await?;
    Ok(Json(BrandVoiceResponse {
        success: true,
        brand_voice,
    }))
}

/// POST /api/brand-voices
pub async fn handle_save_brand_voice(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(request): AppJson<SaveBrandVoiceRequest>,
) -> Result<Json<BrandVoiceResponse>, AppError> {
    let examples = validate_examples(&request.examples)?;

    let user = load_user(state.store.as_ref(), auth.user_id).await?;
    tier::require(user.tier(), Feature::BrandVoice)?;

    let saved = state
        .store
        .upsert_brand_voice(auth.user_id, &examples, request.selected_tone.as_str())
        .await?;
    info!(
        "Saved brand voice for user {} ({} examples)",
        auth.user_id,
        examples.len()
    );

    Ok(Json(BrandVoiceResponse {
        success: true,
        brand_voice: Some(saved),
    }))
}
