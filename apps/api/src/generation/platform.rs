//! Target social platforms and their per-platform formatting guidance.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Tiktok,
    Linkedin,
    Twitter,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Instagram,
        Platform::Tiktok,
        Platform::Linkedin,
        Platform::Twitter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Tiktok => "tiktok",
            Platform::Linkedin => "linkedin",
            Platform::Twitter => "twitter",
        }
    }

    /// One guideline line per platform, spliced into the system prompt.
    pub fn guideline(&self) -> &'static str {
        match self {
            Platform::Instagram => {
                "- Instagram: Under 2,200 characters, use emojis naturally, conversational"
            }
            Platform::Tiktok => "- TikTok: Under 150 characters, energetic, trend-friendly, punchy",
            Platform::Linkedin => {
                "- LinkedIn: Professional, under 3,000 characters, no hashtags in body text"
            }
            Platform::Twitter => "- Twitter: Under 280 characters, conversational, punchy",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown platform '{s}'"))
    }
}

/// Validates a requested platform list: non-empty, duplicates collapsed,
/// selection order preserved.
pub fn normalize_platforms(field: &str, platforms: &[Platform]) -> Result<Vec<Platform>, String> {
    if platforms.is_empty() {
        return Err(format!("{field} must contain at least one platform"));
    }
    let mut selected: Vec<Platform> = Vec::with_capacity(platforms.len());
    for p in platforms {
        if !selected.contains(p) {
            selected.push(*p);
        }
    }
    Ok(selected)
}

pub fn platform_names(platforms: &[Platform]) -> Vec<String> {
    platforms.iter().map(|p| p.as_str().to_string()).collect()
}
