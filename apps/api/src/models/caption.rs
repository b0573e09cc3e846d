use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::generation::platform::Platform;
use crate::generation::tone::Tone;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CaptionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    /// Bare tags, no leading '#'.
    pub hashtags: Vec<String>,
    pub platform: Vec<String>,
    pub tone: String,
    pub brand_voice_id: Option<Uuid>,
    pub source_type: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub scheduled_status: Option<String>,
    pub publish_platforms: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Text,
    Vision,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Text => "text",
            SourceType::Vision => "vision",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    #[default]
    Scheduled,
    Published,
    Failed,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Scheduled => "scheduled",
            ScheduleStatus::Published => "published",
            ScheduleStatus::Failed => "failed",
        }
    }
}

/// A freshly generated caption, not yet persisted.
#[derive(Debug, Clone)]
pub struct NewCaption {
    pub user_id: Uuid,
    pub content: String,
    pub hashtags: Vec<String>,
    pub platform: Vec<Platform>,
    pub tone: Tone,
    pub brand_voice_id: Option<Uuid>,
    pub source_type: SourceType,
}

/// Result of the atomic count-and-insert.
#[derive(Debug, Clone)]
pub struct RecordedGeneration {
    pub caption: CaptionRow,
    /// Daily count after this generation.
    pub daily_count: i32,
}
