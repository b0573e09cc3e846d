// Prompt constants for caption generation and the pure builder that
// assembles them. Templates use `{placeholder}` slots filled with `.replace`.

use crate::billing::tier::{Feature, Tier};
use crate::generation::format::CaptionFormat;
use crate::generation::platform::Platform;
use crate::generation::tone::Tone;
use crate::llm_client::prompts::numbered_quotes;

/// Opening of the system prompt for description-based generation.
pub const TEXT_SYSTEM_INTRO: &str = "You are an expert social media caption writer. \
    Write engaging, authentic captions that don't sound like generic AI-generated content.";

/// Opening of the system prompt for image-based generation.
pub const VISION_SYSTEM_INTRO: &str = "You are an expert social media caption writer. \
    You will be given an image. Analyze the image carefully and generate an engaging, \
    authentic caption based on its visual content. The caption should NOT sound like \
    generic AI output.";

/// Replace: {tone}, {platforms}, {guidelines}
const SYSTEM_BODY_TEMPLATE: &str = "Tone: {tone}
Platforms: {platforms}

Platform-specific guidelines:
{guidelines}";

/// Replace: {examples}
const BRAND_VOICE_TEMPLATE: &str = "Match this brand voice. Here are example captions that show the user's style:
{examples}

Write in this exact style - same tone, vocabulary, sentence structure, and personality.";

/// Paid-tier block. Free prompts never contain it.
pub const VIRAL_OPTIMIZATION_BLOCK: &str = "🔥 VIRAL OPTIMIZATION (Pro feature):
1. HOOK: The first line MUST be scroll-stopping. Use a curiosity gap, bold claim, or provocative question. Never start with generic openers.
2. READABILITY: Use short, punchy sentences. Add strategic line breaks every 1-2 sentences. No walls of text.
3. CTA: End with a clear call-to-action (ask a question, invite comments, or prompt saves/shares).
4. EMOTION: Trigger at least one strong emotion (surprise, FOMO, inspiration, humor).
5. PATTERN INTERRUPT: Include at least one unexpected element that breaks the scroll pattern.";

/// Replace: {description}, {format_instruction}
const TEXT_USER_TEMPLATE: &str = r#"Generate an engaging caption for this content: "{description}"

{format_instruction}

Make the caption authentic and engaging. The hashtags should be specific to the content, not generic. Mix popular and niche tags."#;

/// Replace: {format_instruction}
const VISION_USER_TEMPLATE: &str = "Analyze this image and generate an engaging caption.

{format_instruction}

Make the caption authentic and engaging. The hashtags should be specific to the image content, not generic. Mix popular and niche tags.";

/// What the caption is generated from.
#[derive(Debug, Clone, Copy)]
pub enum PromptSource<'a> {
    Description(&'a str),
    /// The image itself travels as a separate message part.
    Image,
}

#[derive(Debug, Clone)]
pub struct CaptionPromptInput<'a> {
    pub source: PromptSource<'a>,
    pub tone: Tone,
    /// Non-empty, already de-duplicated, in selection order.
    pub platforms: &'a [Platform],
    pub brand_examples: &'a [String],
    pub tier: Tier,
    pub num_hashtags: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionPrompt {
    pub system: String,
    pub user: String,
}

/// Pure: the same input always yields the same prompt.
pub fn build_caption_prompt(input: &CaptionPromptInput<'_>, format: &dyn CaptionFormat) -> CaptionPrompt {
    let intro = match input.source {
        PromptSource::Description(_) => TEXT_SYSTEM_INTRO,
        PromptSource::Image => VISION_SYSTEM_INTRO,
    };

    let platforms = input
        .platforms
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let guidelines = input
        .platforms
        .iter()
        .map(|p| p.guideline())
        .collect::<Vec<_>>()
        .join("\n");

    let mut system = format!(
        "{intro}\n\n{}",
        SYSTEM_BODY_TEMPLATE
            .replace("{tone}", input.tone.as_str())
            .replace("{platforms}", &platforms)
            .replace("{guidelines}", &guidelines)
    );

    let examples: Vec<&str> = input
        .brand_examples
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .collect();
    if !examples.is_empty() {
        system.push_str("\n\n");
        system.push_str(&BRAND_VOICE_TEMPLATE.replace("{examples}", &numbered_quotes(&examples)));
    }

    if input.tier.allows(Feature::ViralOptimization) {
        system.push_str("\n\n");
        system.push_str(VIRAL_OPTIMIZATION_BLOCK);
    }

    let format_instruction = format.instruction(input.num_hashtags);
    let user = match input.source {
        PromptSource::Description(description) => TEXT_USER_TEMPLATE
            .replace("{format_instruction}", &format_instruction)
            .replace("{description}", description),
        PromptSource::Image => {
            VISION_USER_TEMPLATE.replace("{format_instruction}", &format_instruction)
        }
    };

    CaptionPrompt { system, user }
}
