use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One row per (user_id, platform), as written by the OAuth callback.
/// The token columns are never selected into this type.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SocialConnectionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform: String,
    pub platform_handle: Option<String>,
    pub platform_user_id: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub profile_dna: Option<Value>,
    pub connected_at: DateTime<Utc>,
}
