//! Output contract between the caption prompt and the completion text.
//!
//! Two interchangeable formats: labeled lines (`CAPTION:` / `HASHTAGS:`)
//! and the provider's structured JSON mode. Callers only see `ParsedCaption`.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use crate::llm_client::strip_json_fences;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Labeled,
    Json,
}

impl OutputMode {
    pub fn caption_format(&self) -> Arc<dyn CaptionFormat> {
        match self {
            OutputMode::Labeled => Arc::new(LabeledFormat),
            OutputMode::Json => Arc::new(JsonFormat),
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputMode::Labeled => "labeled",
            OutputMode::Json => "json",
        })
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "labeled" => Ok(OutputMode::Labeled),
            "json" => Ok(OutputMode::Json),
            other => Err(format!("unknown caption output mode '{other}'")),
        }
    }
}

/// Caption body plus bare hashtags (no leading '#').
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedCaption {
    pub caption: String,
    pub hashtags: Vec<String>,
}

pub trait CaptionFormat: Send + Sync {
    /// Format instruction appended to the user message.
    fn instruction(&self, num_hashtags: u8) -> String;

    /// Whether the provider should be asked for a JSON object.
    fn json_mode(&self) -> bool;

    /// Never fails: unrecognised output degrades to an empty caption.
    fn parse(&self, raw: &str) -> ParsedCaption;
}

pub struct LabeledFormat;

fn caption_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)CAPTION:\s*(.*?)\s*(?:HASHTAGS:|\z)").expect("valid caption regex")
    })
}

fn hashtags_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Rest of the tag line only; anything the model appends afterwards is ignored.
    RE.get_or_init(|| Regex::new(r"(?i)HASHTAGS:\s*(.*)").expect("valid hashtags regex"))
}

impl CaptionFormat for LabeledFormat {
    fn instruction(&self, num_hashtags: u8) -> String {
        format!(
            "Format your response exactly like this:\n\
             CAPTION: [the caption text]\n\
             HASHTAGS: [#tag1 #tag2 #tag3 ...] ({num_hashtags} relevant hashtags)"
        )
    }

    fn json_mode(&self) -> bool {
        false
    }

    fn parse(&self, raw: &str) -> ParsedCaption {
        let caption = caption_re()
            .captures(raw)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();

        let hashtags = hashtags_re()
            .captures(raw)
            .and_then(|c| c.get(1))
            .map(|m| split_hashtags(m.as_str()))
            .unwrap_or_default();

        ParsedCaption { caption, hashtags }
    }
}

pub struct JsonFormat;

#[derive(Deserialize)]
struct JsonCaption {
    #[serde(default)]
    caption: String,
    #[serde(default)]
    hashtags: Vec<String>,
}

impl CaptionFormat for JsonFormat {
    fn instruction(&self, num_hashtags: u8) -> String {
        format!(
            "Respond with a JSON object of the form \
             {{\"caption\": \"the caption text\", \"hashtags\": [\"tag1\", \"tag2\"]}} \
             containing {num_hashtags} relevant hashtags without the '#' prefix."
        )
    }

    fn json_mode(&self) -> bool {
        true
    }

    fn parse(&self, raw: &str) -> ParsedCaption {
        match serde_json::from_str::<JsonCaption>(strip_json_fences(raw)) {
            Ok(parsed) => ParsedCaption {
                caption: parsed.caption.trim().to_string(),
                hashtags: parsed
                    .hashtags
                    .iter()
                    .flat_map(|tag| split_hashtags(tag))
                    .collect(),
            },
            Err(e) => {
                warn!("Structured caption output did not parse: {e}");
                ParsedCaption::default()
            }
        }
    }
}

fn split_hashtags(raw: &str) -> Vec<String> {
    raw.split_whitespace()
        .map(|token| token.trim_start_matches('#'))
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
