//! Stripe webhook verification and event parsing.

use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, warn};

/// Maximum age (either direction) of the signed timestamp.
const TOLERANCE_SECONDS: i64 = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("Missing timestamp in signature header")]
    MissingTimestamp,
    #[error("Missing v1 signature in signature header")]
    MissingSignature,
    #[error("Invalid timestamp format")]
    InvalidTimestamp,
    #[error("Signature verification failed")]
    SignatureMismatch,
    #[error("Timestamp outside tolerance")]
    Expired,
    #[error("Invalid payload: {0}")]
    Payload(String),
}

/// Metadata the checkout page attaches to sessions and subscriptions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillingMetadata {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    pub tier: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    CheckoutCompleted {
        user_id: Option<String>,
        tier: Option<String>,
        subscription_id: Option<String>,
    },
    SubscriptionUpdated {
        user_id: Option<String>,
        status: String,
        current_period_end: Option<DateTime<Utc>>,
    },
    SubscriptionDeleted {
        user_id: Option<String>,
    },
    Other(String),
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawCheckoutSession {
    subscription: Option<String>,
    #[serde(default)]
    metadata: BillingMetadata,
}

#[derive(Debug, Deserialize)]
struct RawSubscription {
    #[serde(default)]
    status: String,
    current_period_end: Option<i64>,
    #[serde(default)]
    metadata: BillingMetadata,
}

#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verifies the `Stripe-Signature` header against the raw body, then
    /// parses the event.
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<WebhookEvent, WebhookError> {
        self.verify_signature(payload, signature, now)?;

        let raw: RawEvent =
            serde_json::from_slice(payload).map_err(|e| WebhookError::Payload(e.to_string()))?;
        debug!("Verified webhook event {} ({})", raw.id, raw.event_type);

        let event = match raw.event_type.as_str() {
            "checkout.session.completed" => {
                let session: RawCheckoutSession = parse_object(raw.data.object)?;
                WebhookEvent::CheckoutCompleted {
                    user_id: session.metadata.user_id,
                    tier: session.metadata.tier,
                    subscription_id: session.subscription,
                }
            }
            "customer.subscription.updated" => {
                let sub: RawSubscription = parse_object(raw.data.object)?;
                WebhookEvent::SubscriptionUpdated {
                    user_id: sub.metadata.user_id,
                    status: sub.status,
                    current_period_end: sub
                        .current_period_end
                        .and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
                }
            }
            "customer.subscription.deleted" => {
                let sub: RawSubscription = parse_object(raw.data.object)?;
                WebhookEvent::SubscriptionDeleted {
                    user_id: sub.metadata.user_id,
                }
            }
            other => WebhookEvent::Other(other.to_string()),
        };
        Ok(event)
    }

    fn verify_signature(
        &self,
        payload: &[u8],
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<(), WebhookError> {
        // t=timestamp,v1=signature[,v1=...]
        let mut timestamp: Option<&str> = None;
        let mut candidates: Vec<&str> = Vec::new();
        for part in signature.split(',') {
            if let Some((key, value)) = part.trim().split_once('=') {
                match key {
                    "t" => timestamp = Some(value),
                    "v1" => candidates.push(value),
                    _ => {}
                }
            }
        }

        let timestamp = timestamp.ok_or(WebhookError::MissingTimestamp)?;
        if candidates.is_empty() {
            return Err(WebhookError::MissingSignature);
        }

        let expected = hex::encode(self.sign(timestamp, payload)?);
        if !candidates
            .iter()
            .any(|sig| constant_time_eq(sig.as_bytes(), expected.as_bytes()))
        {
            warn!("Webhook signature verification failed");
            return Err(WebhookError::SignatureMismatch);
        }

        let ts: i64 = timestamp
            .parse()
            .map_err(|_| WebhookError::InvalidTimestamp)?;
        if (now.timestamp() - ts).abs() > TOLERANCE_SECONDS {
            warn!("Webhook timestamp {ts} outside tolerance");
            return Err(WebhookError::Expired);
        }

        Ok(())
    }

    fn sign(&self, timestamp: &str, payload: &[u8]) -> Result<Vec<u8>, WebhookError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.as_bytes())
            .map_err(|_| WebhookError::SignatureMismatch)?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    /// Builds a valid header for `payload`; used by tests to sign fixtures.
    #[cfg(test)]
    pub fn signature_header(&self, payload: &[u8], timestamp: i64) -> String {
        format!(
            "t={timestamp},v1={}",
            hex::encode(self.sign(&timestamp.to_string(), payload).unwrap())
        )
    }
}

fn parse_object<T: serde::de::DeserializeOwned>(object: serde_json::Value) -> Result<T, WebhookError> {
    serde_json::from_value(object).map_err(|e| WebhookError::Payload(e.to_string()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}
