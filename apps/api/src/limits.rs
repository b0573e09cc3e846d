//! Per-user request limiter backed by Redis fixed one-minute windows.
//!
//! Fails open: when Redis is unset or unreachable the request proceeds and a
//! warning is logged.

use chrono::{DateTime, Utc};
use redis::Client as RedisClient;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;

const WINDOW_SECONDS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    /// Caption generation endpoints.
    CaptionGeneration,
    /// Other LLM-backed tools.
    Api,
}

impl Bucket {
    pub fn prefix(&self) -> &'static str {
        match self {
            Bucket::CaptionGeneration => "caption",
            Bucket::Api => "api",
        }
    }

    pub fn per_minute(&self) -> i64 {
        match self {
            Bucket::CaptionGeneration => 100,
            Bucket::Api => 60,
        }
    }
}

/// Key for the window containing `now`, e.g. `ratelimit:caption:<user>:29412345`.
pub fn window_key(bucket: Bucket, user_id: Uuid, now: DateTime<Utc>) -> String {
    format!(
        "ratelimit:{}:{}:{}",
        bucket.prefix(),
        user_id,
        now.timestamp().div_euclid(WINDOW_SECONDS)
    )
}

/// `Ok` while `count` (including this request) is within the bucket's budget.
pub fn evaluate(bucket: Bucket, count: i64) -> Result<(), AppError> {
    if count > bucket.per_minute() {
        Err(AppError::RateLimited)
    } else {
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct RateLimiter {
    redis: Option<RedisClient>,
}

impl RateLimiter {
    pub fn new(redis: Option<RedisClient>) -> Self {
        Self { redis }
    }

    pub async fn check(&self, bucket: Bucket, user_id: Uuid) -> Result<(), AppError> {
        let Some(client) = &self.redis else {
            return Ok(());
        };

        let key = window_key(bucket, user_id, Utc::now());
        match hit(client, &key).await {
            Ok(count) => evaluate(bucket, count).inspect_err(|_| {
                warn!("User {user_id} exceeded {} limit", bucket.prefix());
            }),
            Err(e) => {
                warn!("Rate limit check failed, allowing request: {e}");
                Ok(())
            }
        }
    }
}

async fn hit(client: &RedisClient, key: &str) -> redis::RedisResult<i64> {
    let mut conn = client.get_multiplexed_async_connection().await?;
    let (count,): (i64,) = redis::pipe()
        .atomic()
        .incr(key, 1)
        .expire(key, WINDOW_SECONDS)
        .ignore()
        .query_async(&mut conn)
        .await?;
    Ok(count)
}
