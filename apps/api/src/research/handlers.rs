use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::AuthUser;
use crate::billing::tier::{self, Feature};
use crate::errors::{AppError, AppJson};
use crate::generation::generator::load_user;
use crate::generation::platform::Platform;
use crate::limits::Bucket;
use crate::llm_client::prompts::{json_system, numbered_quotes};
use crate::llm_client::{complete_json, CompletionRequest, UserContent, TEXT_MODEL};
use crate::research::prompts::{COMPETITOR_SYSTEM_TEMPLATE, COMPETITOR_USER_TEMPLATE};
use crate::state::AppState;

const MIN_CAPTIONS: usize = 3;
const MAX_CAPTIONS: usize = 20;
const MIN_CAPTION_CHARS: usize = 5;
const MIN_NICHE_CHARS: usize = 2;
const MAX_NICHE_CHARS: usize = 100;

const RESEARCH_TEMPERATURE: f32 = 0.7;
const RESEARCH_MAX_TOKENS: u32 = 1200;

#[derive(Debug, Deserialize)]
pub struct CompetitorRequest {
    pub captions: Vec<String>,
    pub platform: Platform,
    pub niche: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NicheDna {
    pub avg_length: f64,
    pub dominant_tone: String,
    pub emoji_density: String,
    pub hashtag_strategy: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HookPattern {
    pub pattern: String,
    pub example: String,
    pub frequency: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureBlueprint {
    pub opening: String,
    pub body: String,
    pub closing: String,
}

/// Missing sections come back empty rather than failing the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompetitorAnalysis {
    pub niche_dna: NicheDna,
    pub hook_patterns: Vec<HookPattern>,
    pub structure_blueprint: StructureBlueprint,
    pub winning_keywords: Vec<String>,
    pub content_themes: Vec<String>,
    pub golden_rule: String,
    pub generator_prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorResponse {
    pub success: bool,
    pub analysis: CompetitorAnalysis,
    pub platform: Platform,
    pub niche: String,
    pub captions_analyzed: usize,
}

/// Checks caption count and length and niche length. Returns the trimmed niche.
fn validate(request: &CompetitorRequest) -> Result<String, AppError> {
    let count = request.captions.len();
    if !(MIN_CAPTIONS..=MAX_CAPTIONS).contains(&count) {
        return Err(AppError::Validation(format!(
            "captions must contain between {MIN_CAPTIONS} and {MAX_CAPTIONS} entries"
        )));
    }
    if request
        .captions
        .iter()
        .any(|c| c.trim().chars().count() < MIN_CAPTION_CHARS)
    {
        return Err(AppError::Validation(format!(
            "each caption must be at least {MIN_CAPTION_CHARS} characters"
        )));
    }
    let niche = request.niche.trim();
    if !(MIN_NICHE_CHARS..=MAX_NICHE_CHARS).contains(&niche.chars().count()) {
        return Err(AppError::Validation(format!(
            "niche must be between {MIN_NICHE_CHARS} and {MAX_NICHE_CHARS} characters"
        )));
    }
    Ok(niche.to_string())
}

/// POST /api/research/analyze-competitor
pub async fn handle_analyze_competitor(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(request): AppJson<CompetitorRequest>,
) -> Result<Json<CompetitorResponse>, AppError> {
    let user = load_user(state.store.as_ref(), auth.user_id).await?;
    tier::require(user.tier(), Feature::CompetitorResearch)?;

    let niche = validate(&request)?;
    state.limiter.check(Bucket::Api, auth.user_id).await?;

    let count = request.captions.len();
    let system = COMPETITOR_SYSTEM_TEMPLATE
        .replace("{count}", &count.to_string())
        .replace("{niche}", &niche)
        .replace("{platform}", request.platform.as_str());
    let captions: Vec<&str> = request.captions.iter().map(|c| c.trim()).collect();

    let analysis: CompetitorAnalysis = complete_json(
        state.llm.as_ref(),
        CompletionRequest {
            model: TEXT_MODEL,
            system: json_system(&system),
            user: UserContent::Text(
                COMPETITOR_USER_TEMPLATE.replace("{captions}", &numbered_quotes(&captions)),
            ),
            temperature: RESEARCH_TEMPERATURE,
            max_tokens: RESEARCH_MAX_TOKENS,
            json_mode: true,
        },
    )
    .await?;

    info!(
        "Competitor analysis for user {}: {count} captions, niche '{niche}'",
        auth.user_id
    );

    Ok(Json(CompetitorResponse {
        success: true,
        analysis,
        platform: request.platform,
        niche,
        captions_analyzed: count,
    }))
}
