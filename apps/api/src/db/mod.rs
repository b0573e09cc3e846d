//! Relational store behind a trait so handlers get an injected client
//! instead of an ambient pool.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::brand_voice::BrandVoiceRow;
use crate::models::caption::{CaptionRow, NewCaption, RecordedGeneration, ScheduleStatus};
use crate::models::signup::{BetaSignupRow, NewWaitlistEntry, WaitlistRow};
use crate::models::social::SocialConnectionRow;
use crate::models::user::{SubscriptionChange, UserRow};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub type DbResult<T> = std::result::Result<T, sqlx::Error>;

/// Creates and returns a PostgreSQL connection pool, applying pending migrations.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Row-level access to users, captions, brand voices, social connections
/// and pre-launch sign-ups. Every caption/brand-voice/connection query is scoped by `user_id`.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_user(&self, user_id: Uuid) -> DbResult<Option<UserRow>>;

    /// Zeroes the daily counter if `last_reset_date` is unset or before `today`.
    /// Idempotent: a second call on the same day changes nothing.
    async fn reset_daily_count(
        &self,
        user_id: Uuid,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> DbResult<()>;

    /// In one transaction: increments the daily counter (only while it is
    /// below `daily_limit`, when one is given) and inserts the caption.
    /// Returns `None` without writing anything if the limit was already hit.
    async fn record_generation(
        &self,
        caption: NewCaption,
        daily_limit: Option<i32>,
    ) -> DbResult<Option<RecordedGeneration>>;

    /// Newest first.
    async fn list_captions(&self, user_id: Uuid) -> DbResult<Vec<CaptionRow>>;

    /// Returns `false` if nothing owned by `user_id` matched.
    async fn delete_caption(&self, user_id: Uuid, caption_id: Uuid) -> DbResult<bool>;

    async fn schedule_caption(
        &self,
        user_id: Uuid,
        caption_id: Uuid,
        scheduled_at: DateTime<Utc>,
        publish_platforms: &[String],
    ) -> DbResult<Option<CaptionRow>>;

    /// Ascending by `scheduled_at`.
    async fn list_scheduled(
        &self,
        user_id: Uuid,
        status: ScheduleStatus,
    ) -> DbResult<Vec<CaptionRow>>;

    async fn get_brand_voice(&self, user_id: Uuid) -> DbResult<Option<BrandVoiceRow>>;

    async fn get_brand_voice_by_id(
        &self,
        user_id: Uuid,
        brand_voice_id: Uuid,
    ) -> DbResult<Option<BrandVoiceRow>>;

    async fn upsert_brand_voice(
        &self,
        user_id: Uuid,
        examples: &[String],
        selected_tone: &str,
    ) -> DbResult<BrandVoiceRow>;

    /// Newest first.
    async fn list_social_connections(&self, user_id: Uuid) -> DbResult<Vec<SocialConnectionRow>>;

    async fn delete_social_connection(&self, user_id: Uuid, connection_id: Uuid)
        -> DbResult<bool>;

    /// Returns `false` if the user does not exist.
    async fn apply_subscription_change(
        &self,
        user_id: Uuid,
        change: SubscriptionChange,
    ) -> DbResult<bool>;

    /// Returns `None` if the e-mail is already on the list.
    async fn join_waitlist(&self, entry: NewWaitlistEntry) -> DbResult<Option<WaitlistRow>>;

    /// Returns `None` if the e-mail already has an invite.
    async fn create_beta_signup(
        &self,
        email: &str,
        invite_code: &str,
    ) -> DbResult<Option<BetaSignupRow>>;
}
