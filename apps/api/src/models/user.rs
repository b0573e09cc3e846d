use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::warn;
use uuid::Uuid;

use crate::billing::tier::Tier;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub subscription_tier: String,
    pub subscription_status: String,
    pub daily_caption_count: i32,
    pub last_reset_date: Option<DateTime<Utc>>,
    pub stripe_customer_id: Option<String>,
    pub subscription_id: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Parsed tier. An unrecognised stored value is treated as free.
    pub fn tier(&self) -> Tier {
        self.subscription_tier.parse().unwrap_or_else(|_| {
            warn!(
                "User {} has unknown subscription_tier '{}', treating as free",
                self.id, self.subscription_tier
            );
            Tier::Free
        })
    }
}

/// Subscription lifecycle changes driven by the payment provider.
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionChange {
    Activated {
        tier: Tier,
        subscription_id: Option<String>,
    },
    Updated {
        status: String,
        current_period_end: Option<DateTime<Utc>>,
    },
    Canceled,
}
