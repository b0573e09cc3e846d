use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// At most one per user; replaced as a whole on save.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BrandVoiceRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub examples: Vec<String>,
    pub selected_tone: String,
    pub updated_at: DateTime<Utc>,
}
