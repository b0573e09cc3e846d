//! In-memory `Store` for tests. Mirrors the PostgreSQL semantics, including
//! the conditional increment in `record_generation`.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::billing::tier::Tier;
use crate::db::{DbResult, Store};
use crate::generation::platform::platform_names;
use crate::generation::quota::needs_reset;
use crate::models::brand_voice::BrandVoiceRow;
use crate::models::caption::{CaptionRow, NewCaption, RecordedGeneration, ScheduleStatus};
use crate::models::signup::{BetaSignupRow, NewWaitlistEntry, WaitlistRow};
use crate::models::social::SocialConnectionRow;
use crate::models::user::{SubscriptionChange, UserRow};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserRow>,
    captions: Vec<CaptionRow>,
    brand_voices: Vec<BrandVoiceRow>,
    connections: Vec<SocialConnectionRow>,
    waitlist: Vec<WaitlistRow>,
    beta_signups: Vec<BetaSignupRow>,
    /// Monotonic clock for `created_at` so "newest first" is deterministic.
    tick: i64,
}

impl Tables {
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        self.tick += 1;
        Utc::now() + Duration::milliseconds(self.tick)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a user the way the auth provider's sign-up trigger would.
    pub fn insert_user(&self, email: &str, tier: Tier) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        self.put_user(UserRow {
            id,
            email: email.to_string(),
            subscription_tier: tier.as_str().to_string(),
            subscription_status: if tier == Tier::Free { "inactive" } else { "active" }.to_string(),
            daily_caption_count: 0,
            last_reset_date: Some(now),
            stripe_customer_id: None,
            subscription_id: None,
            current_period_end: None,
            created_at: now,
            updated_at: now,
        });
        id
    }

    pub fn put_user(&self, user: UserRow) {
        self.tables.lock().unwrap().users.insert(user.id, user);
    }

    pub fn user(&self, id: Uuid) -> Option<UserRow> {
        self.tables.lock().unwrap().users.get(&id).cloned()
    }

    pub fn caption_count(&self) -> usize {
        self.tables.lock().unwrap().captions.len()
    }

    pub fn beta_signups(&self) -> Vec<BetaSignupRow> {
        self.tables.lock().unwrap().beta_signups.clone()
    }

    pub fn waitlist_len(&self) -> usize {
        self.tables.lock().unwrap().waitlist.len()
    }

    /// Seeds a linked account the way the OAuth callback would.
    pub fn insert_connection(&self, user_id: Uuid, platform: &str) -> Uuid {
        let mut tables = self.tables.lock().unwrap();
        let connected_at = tables.next_timestamp();
        let id = Uuid::new_v4();
        tables.connections.push(SocialConnectionRow {
            id,
            user_id,
            platform: platform.to_string(),
            platform_handle: Some(format!("@{platform}_fan")),
            platform_user_id: None,
            token_expires_at: None,
            profile_dna: None,
            connected_at,
        });
        id
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_user(&self, user_id: Uuid) -> DbResult<Option<UserRow>> {
        Ok(self.user(user_id))
    }

    async fn reset_daily_count(
        &self,
        user_id: Uuid,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(user) = tables.users.get_mut(&user_id) {
            if needs_reset(user.last_reset_date, today) {
                user.daily_caption_count = 0;
                user.last_reset_date = Some(now);
                user.updated_at = now;
            }
        }
        Ok(())
    }

    async fn record_generation(
        &self,
        caption: NewCaption,
        daily_limit: Option<i32>,
    ) -> DbResult<Option<RecordedGeneration>> {
        let mut tables = self.tables.lock().unwrap();
        let created_at = tables.next_timestamp();

        let Some(user) = tables.users.get_mut(&caption.user_id) else {
            return Ok(None);
        };
        if daily_limit.is_some_and(|limit| user.daily_caption_count >= limit) {
            return Ok(None);
        }
        user.daily_caption_count += 1;
        let daily_count = user.daily_caption_count;

        let row = CaptionRow {
            id: Uuid::new_v4(),
            user_id: caption.user_id,
            content: caption.content,
            hashtags: caption.hashtags,
            platform: platform_names(&caption.platform),
            tone: caption.tone.as_str().to_string(),
            brand_voice_id: caption.brand_voice_id,
            source_type: caption.source_type.as_str().to_string(),
            scheduled_at: None,
            scheduled_status: None,
            publish_platforms: Vec::new(),
            created_at,
        };
        tables.captions.push(row.clone());

        Ok(Some(RecordedGeneration {
            caption: row,
            daily_count,
        }))
    }

    async fn list_captions(&self, user_id: Uuid) -> DbResult<Vec<CaptionRow>> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<_> = tables
            .captions
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn delete_caption(&self, user_id: Uuid, caption_id: Uuid) -> DbResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.captions.len();
        tables
            .captions
            .retain(|c| !(c.id == caption_id && c.user_id == user_id));
        Ok(tables.captions.len() < before)
    }

    async fn schedule_caption(
        &self,
        user_id: Uuid,
        caption_id: Uuid,
        scheduled_at: DateTime<Utc>,
        publish_platforms: &[String],
    ) -> DbResult<Option<CaptionRow>> {
        let mut tables = self.tables.lock().unwrap();
        let Some(row) = tables
            .captions
            .iter_mut()
            .find(|c| c.id == caption_id && c.user_id == user_id)
        else {
            return Ok(None);
        };
        row.scheduled_at = Some(scheduled_at);
        row.scheduled_status = Some(ScheduleStatus::Scheduled.as_str().to_string());
        row.publish_platforms = publish_platforms.to_vec();
        Ok(Some(row.clone()))
    }

    async fn list_scheduled(
        &self,
        user_id: Uuid,
        status: ScheduleStatus,
    ) -> DbResult<Vec<CaptionRow>> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<_> = tables
            .captions
            .iter()
            .filter(|c| c.user_id == user_id && c.scheduled_status.as_deref() == Some(status.as_str()))
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.scheduled_at);
        Ok(rows)
    }

    async fn get_brand_voice(&self, user_id: Uuid) -> DbResult<Option<BrandVoiceRow>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .brand_voices
            .iter()
            .find(|v| v.user_id == user_id)
            .cloned())
    }

    async fn get_brand_voice_by_id(
        &self,
        user_id: Uuid,
        brand_voice_id: Uuid,
    ) -> DbResult<Option<BrandVoiceRow>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .brand_voices
            .iter()
            .find(|v| v.id == brand_voice_id && v.user_id == user_id)
            .cloned())
    }

    async fn upsert_brand_voice(
        &self,
        user_id: Uuid,
        examples: &[String],
        selected_tone: &str,
    ) -> DbResult<BrandVoiceRow> {
        let mut tables = self.tables.lock().unwrap();
        let updated_at = tables.next_timestamp();
        if let Some(existing) = tables.brand_voices.iter_mut().find(|v| v.user_id == user_id) {
            existing.examples = examples.to_vec();
            existing.selected_tone = selected_tone.to_string();
            existing.updated_at = updated_at;
            return Ok(existing.clone());
        }
        let row = BrandVoiceRow {
            id: Uuid::new_v4(),
            user_id,
            examples: examples.to_vec(),
            selected_tone: selected_tone.to_string(),
            updated_at,
        };
        tables.brand_voices.push(row.clone());
        Ok(row)
    }

    async fn list_social_connections(&self, user_id: Uuid) -> DbResult<Vec<SocialConnectionRow>> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<_> = tables
            .connections
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.connected_at.cmp(&a.connected_at));
        Ok(rows)
    }

    async fn delete_social_connection(
        &self,
        user_id: Uuid,
        connection_id: Uuid,
    ) -> DbResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.connections.len();
        tables
            .connections
            .retain(|c| !(c.id == connection_id && c.user_id == user_id));
        Ok(tables.connections.len() < before)
    }

    async fn apply_subscription_change(
        &self,
        user_id: Uuid,
        change: SubscriptionChange,
    ) -> DbResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        let Some(user) = tables.users.get_mut(&user_id) else {
            return Ok(false);
        };
        match change {
            SubscriptionChange::Activated {
                tier,
                subscription_id,
            } => {
                user.subscription_tier = tier.as_str().to_string();
                user.subscription_status = "active".to_string();
                user.subscription_id = subscription_id;
            }
            SubscriptionChange::Updated {
                status,
                current_period_end,
            } => {
                user.subscription_status = status;
                user.current_period_end = current_period_end;
            }
            SubscriptionChange::Canceled => {
                user.subscription_tier = Tier::Free.as_str().to_string();
                user.subscription_status = "canceled".to_string();
                user.subscription_id = None;
                user.current_period_end = None;
            }
        }
        user.updated_at = Utc::now();
        Ok(true)
    }

    async fn join_waitlist(&self, entry: NewWaitlistEntry) -> DbResult<Option<WaitlistRow>> {
        let mut tables = self.tables.lock().unwrap();
        if tables.waitlist.iter().any(|w| w.email == entry.email) {
            return Ok(None);
        }
        let created_at = tables.next_timestamp();
        let row = WaitlistRow {
            id: Uuid::new_v4(),
            email: entry.email,
            handle: entry.handle,
            platform: entry.platform,
            created_at,
        };
        tables.waitlist.push(row.clone());
        Ok(Some(row))
    }

    async fn create_beta_signup(
        &self,
        email: &str,
        invite_code: &str,
    ) -> DbResult<Option<BetaSignupRow>> {
        let mut tables = self.tables.lock().unwrap();
        if tables.beta_signups.iter().any(|b| b.email == email) {
            return Ok(None);
        }
        let created_at = tables.next_timestamp();
        let row = BetaSignupRow {
            id: Uuid::new_v4(),
            email: email.to_string(),
            invite_code: invite_code.to_string(),
            status: "pending".to_string(),
            created_at,
        };
        tables.beta_signups.push(row.clone());
        Ok(Some(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::platform::Platform;
    use crate::generation::tone::Tone;
    use crate::models::caption::SourceType;

    fn new_caption(user_id: Uuid) -> NewCaption {
        NewCaption {
            user_id,
            content: "Golden hour never misses".to_string(),
            hashtags: vec!["sunset".to_string()],
            platform: vec![Platform::Instagram],
            tone: Tone::Casual,
            brand_voice_id: None,
            source_type: SourceType::Text,
        }
    }

    #[tokio::test]
    async fn test_record_generation_respects_limit_without_writing() {
        let store = MemoryStore::new();
        let user_id = store.insert_user("a@example.com", Tier::Free);

        let first = store.record_generation(new_caption(user_id), Some(1)).await.unwrap();
        assert_eq!(first.unwrap().daily_count, 1);

        let second = store.record_generation(new_caption(user_id), Some(1)).await.unwrap();
        assert!(second.is_none());
        assert_eq!(store.caption_count(), 1, "denied generation must not insert");
        assert_eq!(store.user(user_id).unwrap().daily_caption_count, 1);
    }

    #[tokio::test]
    async fn test_social_connections_scoped_to_owner() {
        let store = MemoryStore::new();
        let owner = store.insert_user("a@example.com", Tier::Pro);
        let stranger = store.insert_user("b@example.com", Tier::Pro);
        let older = store.insert_connection(owner, "instagram");
        let newer = store.insert_connection(owner, "tiktok");

        let rows = store.list_social_connections(owner).await.unwrap();
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![newer, older]);
        assert!(store.list_social_connections(stranger).await.unwrap().is_empty());

        assert!(!store.delete_social_connection(stranger, older).await.unwrap());
        assert!(store.delete_social_connection(owner, older).await.unwrap());
        assert_eq!(store.list_social_connections(owner).await.unwrap().len(), 1);
    }
}
