//! Caption tools that work on text the user already has: hook ideas, a viral
//! score, and a rewrite. None of them persist anything or touch the quota.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::AuthUser;
use crate::errors::{AppError, AppJson};
use crate::generation::platform::{normalize_platforms, platform_names, Platform};
use crate::generation::tone::Tone;
use crate::limits::Bucket;
use crate::llm_client::prompts::json_system;
use crate::llm_client::{complete_json, CompletionRequest, UserContent, TEXT_MODEL};
use crate::state::AppState;

const MIN_TEXT_CHARS: usize = 5;
const MAX_TEXT_CHARS: usize = 5000;
const HOOK_COUNT: usize = 5;

/// Replace: {platform}
const HOOKS_SYSTEM_TEMPLATE: &str = r#"You are a viral hook specialist. Your goal is to generate 5 "scroll-stopping" first lines (hooks) for a social media post on {platform}.

Hook styles to include:
1. Question: Spark curiosity.
2. Controversial: State something bold.
3. How-to: Promise value.
4. Negative: Warn against a mistake.
5. Listicle: Promise order/quick learning.

Return an object with a "hooks" key holding an array of 5 strings."#;

/// Replace: {platforms}
const ANALYZE_SYSTEM_TEMPLATE: &str = r#"You are a social media viral growth expert. Analyze the provided caption for {platforms} and provide a viral potential score (0-100).

Evaluate based on:
1. Hook: Is the first line scroll-stopping?
2. Readability: Is it easy to scan?
3. Call-to-Action (CTA): Is there a clear next step?
4. Platform Fit: Does it follow best practices for the chosen platforms?

Format your response EXACTLY as a JSON object:
{
  "score": number,
  "breakdown": { "hook": number, "flow": number, "cta": number },
  "feedback": [string, string, string],
  "suggestion": "One power tip to make this 10x better"
}"#;

/// Replace: {platforms}, {tone}, {feedback_context}
const BOOST_SYSTEM_TEMPLATE: &str = r#"You are a viral social media copywriter specializing in {platforms}.
Your task is to REWRITE the provided caption to maximize engagement and viral potential.

Rules:
1. Keep the same core message and intent.
2. Match the "{tone}" tone of voice.
3. Make the hook (first line) absolutely scroll-stopping.
4. Improve readability with short punchy sentences and strategic line breaks.
5. Add a clear call-to-action if missing.
6. Use platform-specific best practices.
7. Address ALL the feedback points listed below.
{feedback_context}

Return ONLY the improved caption text. No explanations, no quotes around it."#;

fn validate_text(field: &str, text: &str) -> Result<String, AppError> {
    let text = text.trim();
    let chars = text.chars().count();
    if !(MIN_TEXT_CHARS..=MAX_TEXT_CHARS).contains(&chars) {
        return Err(AppError::Validation(format!(
            "{field} must be between {MIN_TEXT_CHARS} and {MAX_TEXT_CHARS} characters"
        )));
    }
    Ok(text.to_string())
}

fn platform_list(platforms: &[Platform]) -> String {
    platform_names(platforms).join(", ")
}

// ────────────────────────────────────────────────────────────────────────────
// Hooks
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HooksRequest {
    pub content: String,
    #[serde(default = "default_platform")]
    pub platform: Platform,
}

fn default_platform() -> Platform {
    Platform::Instagram
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HooksResponse {
    #[serde(default)]
    pub hooks: Vec<String>,
}

/// POST /api/generate-hooks
pub async fn handle_generate_hooks(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(request): AppJson<HooksRequest>,
) -> Result<Json<HooksResponse>, AppError> {
    let content = validate_text("content", &request.content)?;
    state.limiter.check(Bucket::Api, auth.user_id).await?;

    let mut response: HooksResponse = complete_json(
        state.llm.as_ref(),
        CompletionRequest {
            model: TEXT_MODEL,
            system: json_system(&HOOKS_SYSTEM_TEMPLATE.replace("{platform}", request.platform.as_str())),
            user: UserContent::Text(format!("Generate hooks for this content:\n\n\"{content}\"")),
            temperature: 0.8,
            max_tokens: 400,
            json_mode: true,
        },
    )
    .await?;

    response.hooks.retain(|h| !h.trim().is_empty());
    response.hooks.truncate(HOOK_COUNT);
    Ok(Json(response))
}

// ────────────────────────────────────────────────────────────────────────────
// Viral score
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub caption: String,
    pub platform: Vec<Platform>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    #[serde(default, deserialize_with = "percent")]
    pub hook: u8,
    #[serde(default, deserialize_with = "percent")]
    pub flow: u8,
    #[serde(default, deserialize_with = "percent")]
    pub cta: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionAnalysis {
    #[serde(deserialize_with = "percent")]
    pub score: u8,
    #[serde(default)]
    pub breakdown: ScoreBreakdown,
    #[serde(default)]
    pub feedback: Vec<String>,
    #[serde(default)]
    pub suggestion: String,
}

/// Scores are percentages, but the model sends any JSON number: fractions,
/// negatives, values past 100. Rounded and clamped into 0..=100.
fn percent<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.is_nan() {
        return Ok(0);
    }
    Ok(value.round().clamp(0.0, 100.0) as u8)
}

/// POST /api/analyze-caption
pub async fn handle_analyze_caption(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(request): AppJson<AnalyzeRequest>,
) -> Result<Json<CaptionAnalysis>, AppError> {
    let caption = validate_text("caption", &request.caption)?;
    let platforms = normalize_platforms("platform", &request.platform).map_err(AppError::Validation)?;
    state.limiter.check(Bucket::Api, auth.user_id).await?;

    let analysis: CaptionAnalysis = complete_json(
        state.llm.as_ref(),
        CompletionRequest {
            model: TEXT_MODEL,
            system: json_system(&ANALYZE_SYSTEM_TEMPLATE.replace("{platforms}", &platform_list(&platforms))),
            user: UserContent::Text(format!("Analyze this caption:\n\n\"{caption}\"")),
            temperature: 0.7,
            max_tokens: 600,
            json_mode: true,
        },
    )
    .await?;

    Ok(Json(analysis))
}

// ────────────────────────────────────────────────────────────────────────────
// Boost
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BoostRequest {
    pub caption: String,
    pub platform: Vec<Platform>,
    pub tone: Tone,
    #[serde(default)]
    pub feedback: Vec<String>,
    pub suggestion: Option<String>,
    pub score: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoostResponse {
    pub boosted_caption: String,
}

fn feedback_context(request: &BoostRequest) -> String {
    if request.feedback.is_empty() {
        return String::new();
    }
    let points = request
        .feedback
        .iter()
        .enumerate()
        .map(|(i, f)| format!("{}. {f}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");
    let score = request
        .score
        .map(|s| format!("{}", s.round()))
        .unwrap_or_else(|| "Unknown".to_string());
    format!(
        "\nPrevious AI feedback on this caption:\n{points}\n\nPower tip: {}\nCurrent score: {score}/100",
        request.suggestion.as_deref().unwrap_or("N/A")
    )
}

/// POST /api/boost-caption
///
/// Falls back to the original caption when the rewrite comes back empty.
pub async fn handle_boost_caption(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(request): AppJson<BoostRequest>,
) -> Result<Json<BoostResponse>, AppError> {
    let caption = validate_text("caption", &request.caption)?;
    let platforms = normalize_platforms("platform", &request.platform).map_err(AppError::Validation)?;
    state.limiter.check(Bucket::Api, auth.user_id).await?;

    let system = BOOST_SYSTEM_TEMPLATE
        .replace("{platforms}", &platform_list(&platforms))
        .replace("{tone}", request.tone.as_str())
        .replace("{feedback_context}", &feedback_context(&request));

    let result = state
        .llm
        .complete(CompletionRequest {
            model: TEXT_MODEL,
            system,
            user: UserContent::Text(format!("Rewrite this caption to score 90+:\n\n{caption}")),
            temperature: 0.8,
            max_tokens: 600,
            json_mode: false,
        })
        .await;

    let boosted_caption = match result {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => caption,
        Err(crate::llm_client::LlmError::EmptyContent) => {
            warn!("Boost for user {} came back empty, returning original", auth.user_id);
            caption
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Json(BoostResponse { boosted_caption }))
}
