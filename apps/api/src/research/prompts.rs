/// System prompt for competitor analysis.
/// Replace: {count}, {niche}, {platform}
pub const COMPETITOR_SYSTEM_TEMPLATE: &str = r#"You are an elite social media strategist who reverse-engineers viral content. Analyze the following {count} competitor captions from the "{niche}" niche on {platform}.

Extract the hidden patterns that make these posts perform. Be brutally specific. No generic advice.

Format your response EXACTLY as a JSON object:
{
  "nicheDna": {
    "avgLength": number,
    "dominantTone": "string (e.g. 'vulnerable storytelling', 'provocative hot-take')",
    "emojiDensity": "string (e.g. 'heavy', 'minimal', 'strategic')",
    "hashtagStrategy": "string describing their tag approach"
  },
  "hookPatterns": [
    { "pattern": "string (e.g. 'Curiosity Gap Question')", "example": "string", "frequency": "string (e.g. '60% of posts')" }
  ],
  "structureBlueprint": {
    "opening": "string describing how they start",
    "body": "string describing the middle section pattern",
    "closing": "string describing how they end / CTA style"
  },
  "winningKeywords": ["string", "string", "string"],
  "contentThemes": ["string", "string", "string"],
  "goldenRule": "One single sentence summarizing WHY these captions work",
  "generatorPrompt": "A ready-to-use instruction that can be pasted into a caption generator to replicate this style (2-3 sentences max)"
}"#;

/// Replace: {captions}
pub const COMPETITOR_USER_TEMPLATE: &str = "Analyze these competitor captions:\n\n{captions}";
