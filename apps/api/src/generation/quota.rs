//! Free-tier daily generation quota.
//!
//! The counter resets lazily: the first read on a new UTC calendar day zeroes
//! it. The limit is checked before the completion call so a denied request
//! costs nothing, and charged only by `Store::record_generation`, which
//! increments and inserts atomically.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::billing::tier::{Feature, Tier};
use crate::db::Store;
use crate::errors::AppError;
use crate::models::user::UserRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    /// `None` for tiers without a daily cap.
    pub remaining: Option<i32>,
}

/// True when the counter belongs to an earlier day (or was never reset).
pub fn needs_reset(last_reset: Option<DateTime<Utc>>, today: NaiveDate) -> bool {
    match last_reset {
        None => true,
        Some(ts) => ts.date_naive() < today,
    }
}

/// The cap for `tier`, or `None` when unlimited.
pub fn daily_limit(tier: Tier, free_limit: i32) -> Option<i32> {
    if tier.allows(Feature::UnlimitedGenerations) {
        None
    } else {
        Some(free_limit)
    }
}

/// Generations left after `used` today, never negative.
pub fn remaining(tier: Tier, used: i32, free_limit: i32) -> Option<i32> {
    daily_limit(tier, free_limit).map(|limit| (limit - used).max(0))
}

/// Pre-flight check against the current (already reset) count.
pub fn check(tier: Tier, used: i32, free_limit: i32) -> Result<QuotaStatus, AppError> {
    match daily_limit(tier, free_limit) {
        Some(limit) if used >= limit => Err(AppError::QuotaExceeded),
        _ => Ok(QuotaStatus {
            remaining: remaining(tier, used, free_limit),
        }),
    }
}

/// Applies the lazy daily reset and returns the user as it now stands.
pub async fn refresh(
    store: &dyn Store,
    mut user: UserRow,
    now: DateTime<Utc>,
) -> Result<UserRow, AppError> {
    let today = now.date_naive();
    if needs_reset(user.last_reset_date, today) {
        store.reset_daily_count(user.id, today, now).await?;
        user.daily_caption_count = 0;
        user.last_reset_date = Some(now);
    }
    Ok(user)
}
