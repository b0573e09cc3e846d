//! Caption generation: orchestrates the full pipeline.
//!
//! Flow: load user → lazy daily reset → quota pre-check → brand voice →
//!       prompt → completion → parse → atomic count-and-insert → response.
//!
//! Nothing is written unless the completion produced a caption; a denied or
//! failed generation never consumes quota.

use std::sync::Arc;

use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::billing::tier::{self, Feature, Tier};
use crate::db::Store;
use crate::errors::AppError;
use crate::generation::format::CaptionFormat;
use crate::generation::platform::{normalize_platforms, Platform};
use crate::generation::prompts::{build_caption_prompt, CaptionPromptInput, PromptSource};
use crate::generation::quota;
use crate::generation::tone::Tone;
use crate::llm_client::{CompletionProvider, CompletionRequest, UserContent, TEXT_MODEL, VISION_MODEL};
use crate::models::caption::{NewCaption, SourceType};
use crate::models::user::UserRow;

pub const CAPTION_TEMPERATURE: f32 = 0.8;
pub const CAPTION_MAX_TOKENS: u32 = 500;

pub const MIN_HASHTAGS: u8 = 5;
pub const MAX_HASHTAGS: u8 = 15;
pub const DEFAULT_HASHTAGS: u8 = 10;

const MIN_DESCRIPTION_CHARS: usize = 5;
const MAX_DESCRIPTION_CHARS: usize = 1000;

/// Decoded image cap.
pub const MAX_IMAGE_BYTES: usize = 4 * 1024 * 1024;
const MIN_IMAGE_BASE64_CHARS: usize = 100;
const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

// ────────────────────────────────────────────────────────────────────────────
// Request / response
// ────────────────────────────────────────────────────────────────────────────

/// Options shared by the text and image endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionOptions {
    pub tone: Tone,
    pub platform: Vec<Platform>,
    pub brand_voice_id: Option<Uuid>,
    pub num_hashtags: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCaptionRequest {
    pub description: String,
    #[serde(flatten)]
    pub options: CaptionOptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVisionRequest {
    pub image_base64: String,
    pub mime_type: String,
    #[serde(flatten)]
    pub options: CaptionOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedCaption {
    pub id: Uuid,
    pub content: String,
    pub hashtags: Vec<String>,
    pub platform: Vec<Platform>,
    pub tone: Tone,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCaptionResponse {
    pub success: bool,
    pub caption: GeneratedCaption,
    /// `None` (JSON null) for tiers without a daily cap.
    pub remaining_today: Option<i32>,
    pub tier: Tier,
}

/// What to caption, after input validation.
#[derive(Debug, Clone)]
pub enum CaptionSource {
    Description(String),
    Image { mime_type: String, data: String },
}

/// Validated, normalized generation input.
#[derive(Debug, Clone)]
pub struct CaptionJob {
    pub user_id: Uuid,
    pub source: CaptionSource,
    pub tone: Tone,
    pub platforms: Vec<Platform>,
    pub brand_voice_id: Option<Uuid>,
    pub num_hashtags: u8,
}

/// Collaborators the pipeline needs; built from `AppState` by the handlers.
#[derive(Clone)]
pub struct CaptionGenerator {
    pub store: Arc<dyn Store>,
    pub llm: Arc<dyn CompletionProvider>,
    pub format: Arc<dyn CaptionFormat>,
    pub free_daily_limit: i32,
}

// ────────────────────────────────────────────────────────────────────────────
// Validation
// ────────────────────────────────────────────────────────────────────────────

/// Clamps into 5..=15; absent means 10.
pub fn clamp_hashtags(requested: Option<u8>) -> u8 {
    requested
        .unwrap_or(DEFAULT_HASHTAGS)
        .clamp(MIN_HASHTAGS, MAX_HASHTAGS)
}

impl CaptionJob {
    pub fn from_text(user_id: Uuid, request: GenerateCaptionRequest) -> Result<Self, AppError> {
        let description = request.description.trim().to_string();
        let chars = description.chars().count();
        if !(MIN_DESCRIPTION_CHARS..=MAX_DESCRIPTION_CHARS).contains(&chars) {
            return Err(AppError::Validation(format!(
                "description must be between {MIN_DESCRIPTION_CHARS} and {MAX_DESCRIPTION_CHARS} characters"
            )));
        }
        Self::with_options(user_id, CaptionSource::Description(description), request.options)
    }

    pub fn from_image(user_id: Uuid, request: GenerateVisionRequest) -> Result<Self, AppError> {
        if !ALLOWED_IMAGE_TYPES.contains(&request.mime_type.as_str()) {
            return Err(AppError::Validation(format!(
                "mimeType must be one of {}",
                ALLOWED_IMAGE_TYPES.join(", ")
            )));
        }
        let data = request.image_base64.trim().to_string();
        validate_image(&data)?;
        Self::with_options(
            user_id,
            CaptionSource::Image {
                mime_type: request.mime_type,
                data,
            },
            request.options,
        )
    }

    fn with_options(
        user_id: Uuid,
        source: CaptionSource,
        options: CaptionOptions,
    ) -> Result<Self, AppError> {
        let platforms =
            normalize_platforms("platform", &options.platform).map_err(AppError::Validation)?;
        Ok(Self {
            user_id,
            source,
            tone: options.tone,
            platforms,
            brand_voice_id: options.brand_voice_id,
            num_hashtags: clamp_hashtags(options.num_hashtags),
        })
    }

    fn source_type(&self) -> SourceType {
        match self.source {
            CaptionSource::Description(_) => SourceType::Text,
            CaptionSource::Image { .. } => SourceType::Vision,
        }
    }
}

fn validate_image(data: &str) -> Result<(), AppError> {
    if data.len() < MIN_IMAGE_BASE64_CHARS {
        return Err(AppError::Validation("Image data is required".to_string()));
    }
    // Cheap estimate first so oversized payloads are never decoded.
    if data.len() / 4 * 3 > MAX_IMAGE_BYTES + 3 {
        return Err(AppError::Validation(
            "Image too large. Maximum size is 4MB.".to_string(),
        ));
    }
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|_| AppError::Validation("imageBase64 is not valid base64".to_string()))?;
    if decoded.len() > MAX_IMAGE_BYTES {
        return Err(AppError::Validation(
            "Image too large. Maximum size is 4MB.".to_string(),
        ));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

impl CaptionGenerator {
    /// Runs the generation pipeline for an already-validated job.
    pub async fn generate(&self, job: CaptionJob) -> Result<GenerateCaptionResponse, AppError> {
        // Step 1: user record
        let user = load_user(self.store.as_ref(), job.user_id).await?;

        // Step 2: lazy daily reset, then the quota pre-check
        let user = quota::refresh(self.store.as_ref(), user, Utc::now()).await?;
        let tier = user.tier();
        quota::check(tier, user.daily_caption_count, self.free_daily_limit)?;

        // Step 3: brand voice (paid feature, must be owned by the caller)
        let brand_examples = match job.brand_voice_id {
            Some(brand_voice_id) => {
                tier::require(tier, Feature::BrandVoice)?;
                self.store
                    .get_brand_voice_by_id(job.user_id, brand_voice_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Brand voice not found".to_string()))?
                    .examples
            }
            None => Vec::new(),
        };

        // Step 4: prompt
        let prompt_source = match &job.source {
            CaptionSource::Description(description) => PromptSource::Description(description),
            CaptionSource::Image { .. } => PromptSource::Image,
        };
        let prompt = build_caption_prompt(
            &CaptionPromptInput {
                source: prompt_source,
                tone: job.tone,
                platforms: &job.platforms,
                brand_examples: &brand_examples,
                tier,
                num_hashtags: job.num_hashtags,
            },
            self.format.as_ref(),
        );

        let (model, user_content) = match &job.source {
            CaptionSource::Description(_) => (TEXT_MODEL, UserContent::Text(prompt.user)),
            CaptionSource::Image { mime_type, data } => (
                VISION_MODEL,
                UserContent::TextWithImage {
                    text: prompt.user,
                    image_data_url: format!("data:{mime_type};base64,{data}"),
                },
            ),
        };

        // Step 5: completion
        info!(
            "Generating {} caption for user {} (tier={tier}, model={model})",
            job.source_type().as_str(),
            job.user_id
        );
        let raw = self
            .llm
            .complete(CompletionRequest {
                model,
                system: prompt.system,
                user: user_content,
                temperature: CAPTION_TEMPERATURE,
                max_tokens: CAPTION_MAX_TOKENS,
                json_mode: self.format.json_mode(),
            })
            .await?;

        // Step 6: parse
        let mut parsed = self.format.parse(&raw);
        if parsed.caption.is_empty() {
            warn!(
                "Completion for user {} had no caption: {:?}",
                job.user_id,
                raw.chars().take(80).collect::<String>()
            );
            return Err(AppError::Generation(
                "completion did not contain a caption".to_string(),
            ));
        }
        parsed.hashtags.truncate(usize::from(job.num_hashtags));

        // Step 7: count-and-insert; the limit is re-checked atomically
        let limit = quota::daily_limit(tier, self.free_daily_limit);
        let recorded = self
            .store
            .record_generation(
                NewCaption {
                    user_id: job.user_id,
                    content: parsed.caption,
                    hashtags: parsed.hashtags,
                    platform: job.platforms.clone(),
                    tone: job.tone,
                    brand_voice_id: job.brand_voice_id,
                    source_type: job.source_type(),
                },
                limit,
            )
            .await?
            .ok_or(AppError::QuotaExceeded)?;

        info!(
            "Saved caption {} for user {} (daily count {})",
            recorded.caption.id, job.user_id, recorded.daily_count
        );

        Ok(GenerateCaptionResponse {
            success: true,
            caption: GeneratedCaption {
                id: recorded.caption.id,
                content: recorded.caption.content,
                hashtags: recorded.caption.hashtags,
                platform: job.platforms,
                tone: job.tone,
            },
            remaining_today: quota::remaining(tier, recorded.daily_count, self.free_daily_limit),
            tier,
        })
    }
}

/// Fetches the caller's user row; a missing row is a 404.
pub async fn load_user(store: &dyn Store, user_id: Uuid) -> Result<UserRow, AppError> {
    store
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
