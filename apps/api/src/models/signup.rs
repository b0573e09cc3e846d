use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistRow {
    pub id: Uuid,
    pub email: String,
    pub handle: String,
    pub platform: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWaitlistEntry {
    pub email: String,
    pub handle: String,
    pub platform: String,
}

/// `status` stays `pending` until the invite is redeemed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BetaSignupRow {
    pub id: Uuid,
    pub email: String,
    pub invite_code: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
