use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db::{DbResult, Store};
use crate::generation::platform::platform_names;
use crate::models::brand_voice::BrandVoiceRow;
use crate::models::caption::{CaptionRow, NewCaption, RecordedGeneration, ScheduleStatus};
use crate::models::signup::{BetaSignupRow, NewWaitlistEntry, WaitlistRow};
use crate::models::social::SocialConnectionRow;
use crate::models::user::{SubscriptionChange, UserRow};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn get_user(&self, user_id: Uuid) -> DbResult<Option<UserRow>> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn reset_daily_count(
        &self,
        user_id: Uuid,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET daily_caption_count = 0, last_reset_date = $2, updated_at = $2
            WHERE id = $1
              AND (last_reset_date IS NULL OR (last_reset_date AT TIME ZONE 'UTC')::date < $3)
            "#,
        )
        .bind(user_id)
        .bind(now)
        .bind(today)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            info!("Reset daily caption count for user {user_id}");
        }
        Ok(())
    }

    async fn record_generation(
        &self,
        caption: NewCaption,
        daily_limit: Option<i32>,
    ) -> DbResult<Option<RecordedGeneration>> {
        let mut tx = self.pool.begin().await?;

        // Conditional increment: the limit check and the write are one statement.
        let daily_count: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE users
            SET daily_caption_count = daily_caption_count + 1, updated_at = NOW()
            WHERE id = $1 AND ($2::INTEGER IS NULL OR daily_caption_count < $2)
            RETURNING daily_caption_count
            "#,
        )
        .bind(caption.user_id)
        .bind(daily_limit)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(daily_count) = daily_count else {
            tx.rollback().await?;
            return Ok(None);
        };

        let row = sqlx::query_as::<_, CaptionRow>(
            r#"
            INSERT INTO captions
                (user_id, content, hashtags, platform, tone, brand_voice_id, source_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(caption.user_id)
        .bind(&caption.content)
        .bind(&caption.hashtags)
        .bind(platform_names(&caption.platform))
        .bind(caption.tone.as_str())
        .bind(caption.brand_voice_id)
        .bind(caption.source_type.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(RecordedGeneration {
            caption: row,
            daily_count,
        }))
    }

    async fn list_captions(&self, user_id: Uuid) -> DbResult<Vec<CaptionRow>> {
        sqlx::query_as::<_, CaptionRow>(
            "SELECT * FROM captions WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn delete_caption(&self, user_id: Uuid, caption_id: Uuid) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM captions WHERE id = $1 AND user_id = $2")
            .bind(caption_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn schedule_caption(
        &self,
        user_id: Uuid,
        caption_id: Uuid,
        scheduled_at: DateTime<Utc>,
        publish_platforms: &[String],
    ) -> DbResult<Option<CaptionRow>> {
        sqlx::query_as::<_, CaptionRow>(
            r#"
            UPDATE captions
            SET scheduled_at = $3, scheduled_status = $4, publish_platforms = $5
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(caption_id)
        .bind(user_id)
        .bind(scheduled_at)
        .bind(ScheduleStatus::Scheduled.as_str())
        .bind(publish_platforms)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_scheduled(
        &self,
        user_id: Uuid,
        status: ScheduleStatus,
    ) -> DbResult<Vec<CaptionRow>> {
        sqlx::query_as::<_, CaptionRow>(
            r#"
            SELECT * FROM captions
            WHERE user_id = $1 AND scheduled_status = $2
            ORDER BY scheduled_at ASC
            "#,
        )
        .bind(user_id)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
    }

    async fn get_brand_voice(&self, user_id: Uuid) -> DbResult<Option<BrandVoiceRow>> {
        sqlx::query_as::<_, BrandVoiceRow>("SELECT * FROM brand_voices WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_brand_voice_by_id(
        &self,
        user_id: Uuid,
        brand_voice_id: Uuid,
    ) -> DbResult<Option<BrandVoiceRow>> {
        sqlx::query_as::<_, BrandVoiceRow>(
            "SELECT * FROM brand_voices WHERE id = $1 AND user_id = $2",
        )
        .bind(brand_voice_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn upsert_brand_voice(
        &self,
        user_id: Uuid,
        examples: &[String],
        selected_tone: &str,
    ) -> DbResult<BrandVoiceRow> {
        sqlx::query_as::<_, BrandVoiceRow>(
            r#"
            INSERT INTO brand_voices (user_id, examples, selected_tone, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id) DO UPDATE
            SET examples = EXCLUDED.examples,
                selected_tone = EXCLUDED.selected_tone,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(examples)
        .bind(selected_tone)
        .fetch_one(&self.pool)
        .await
    }

    async fn list_social_connections(&self, user_id: Uuid) -> DbResult<Vec<SocialConnectionRow>> {
        sqlx::query_as::<_, SocialConnectionRow>(
            r#"
            SELECT id, user_id, platform, platform_handle, platform_user_id,
                   token_expires_at, profile_dna, connected_at
            FROM social_connections
            WHERE user_id = $1
            ORDER BY connected_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn delete_social_connection(
        &self,
        user_id: Uuid,
        connection_id: Uuid,
    ) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM social_connections WHERE id = $1 AND user_id = $2")
            .bind(connection_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn apply_subscription_change(
        &self,
        user_id: Uuid,
        change: SubscriptionChange,
    ) -> DbResult<bool> {
        let result = match change {
            SubscriptionChange::Activated {
                tier,
                subscription_id,
            } => {
                sqlx::query(
                    r#"
                    UPDATE users
                    SET subscription_tier = $2, subscription_status = 'active',
                        subscription_id = $3, updated_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(user_id)
                .bind(tier.as_str())
                .bind(subscription_id)
                .execute(&self.pool)
                .await?
            }
            SubscriptionChange::Updated {
                status,
                current_period_end,
            } => {
                sqlx::query(
                    r#"
                    UPDATE users
                    SET subscription_status = $2, current_period_end = $3, updated_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(user_id)
                .bind(status)
                .bind(current_period_end)
                .execute(&self.pool)
                .await?
            }
            SubscriptionChange::Canceled => {
                sqlx::query(
                    r#"
                    UPDATE users
                    SET subscription_tier = 'free', subscription_status = 'canceled',
                        subscription_id = NULL, current_period_end = NULL, updated_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(user_id)
                .execute(&self.pool)
                .await?
            }
        };

        Ok(result.rows_affected() > 0)
    }

    async fn join_waitlist(&self, entry: NewWaitlistEntry) -> DbResult<Option<WaitlistRow>> {
        sqlx::query_as::<_, WaitlistRow>(
            r#"
            INSERT INTO waitlist (email, handle, platform)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, email, handle, platform, created_at
            "#,
        )
        .bind(&entry.email)
        .bind(&entry.handle)
        .bind(&entry.platform)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_beta_signup(
        &self,
        email: &str,
        invite_code: &str,
    ) -> DbResult<Option<BetaSignupRow>> {
        sqlx::query_as::<_, BetaSignupRow>(
            r#"
            INSERT INTO beta_signups (email, invite_code, status)
            VALUES ($1, $2, 'pending')
            ON CONFLICT (email) DO NOTHING
            RETURNING id, email, invite_code, status, created_at
            "#,
        )
        .bind(email)
        .bind(invite_code)
        .fetch_optional(&self.pool)
        .await
    }
}
