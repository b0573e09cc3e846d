//! Axum route handlers for subscription state: the payment webhook and the
//! caller's account summary.

use axum::{extract::State, http::HeaderMap, Json};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::billing::tier::Tier;
use crate::billing::webhook::{WebhookError, WebhookEvent};
use crate::errors::AppError;
use crate::generation::generator::load_user;
use crate::generation::quota;
use crate::models::user::SubscriptionChange;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Account
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUser {
    pub id: Uuid,
    pub email: String,
    pub subscription_tier: Tier,
    pub subscription_status: String,
    pub daily_caption_count: i32,
    pub last_reset_date: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub success: bool,
    pub user: AccountUser,
    pub remaining_today: Option<i32>,
}

/// GET /api/user
///
/// Tier and today's usage, after the lazy daily reset.
pub async fn handle_get_user(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<AccountResponse>, AppError> {
    let user = load_user(state.store.as_ref(), auth.user_id).await?;
    let user = quota::refresh(state.store.as_ref(), user, Utc::now()).await?;
    let tier = user.tier();

    Ok(Json(AccountResponse {
        success: true,
        remaining_today: quota::remaining(
            tier,
            user.daily_caption_count,
            state.config.free_daily_limit,
        ),
        user: AccountUser {
            id: user.id,
            email: user.email,
            subscription_tier: tier,
            subscription_status: user.subscription_status,
            daily_caption_count: user.daily_caption_count,
            last_reset_date: user.last_reset_date,
            current_period_end: user.current_period_end,
        },
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Webhook
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/stripe-webhook
///
/// Public. Nothing in the body is trusted until the signature checks out.
pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Validation("Missing stripe-signature header".to_string()))?;

    let event = state
        .webhooks
        .verify_and_parse(&body, signature, Utc::now())
        .map_err(|e| {
            warn!("Rejected webhook: {e}");
            match e {
                WebhookError::Payload(_) => AppError::Validation("Invalid payload".to_string()),
                _ => AppError::Validation("Invalid signature".to_string()),
            }
        })?;

    match event {
        WebhookEvent::CheckoutCompleted {
            user_id,
            tier,
            subscription_id,
        } => {
            let (Some(user_id), Some(tier)) = (user_id, tier) else {
                warn!("Checkout session without userId/tier metadata");
                return Err(AppError::Validation("Missing metadata".to_string()));
            };
            let tier: Tier = tier
                .parse()
                .map_err(|_| AppError::Validation(format!("Unknown tier '{tier}'")))?;
            let user_id = parse_user_id(&user_id)?;
            let user = load_user(state.store.as_ref(), user_id).await?;
            let was_free = user.tier() == Tier::Free;

            state
                .store
                .apply_subscription_change(
                    user_id,
                    SubscriptionChange::Activated {
                        tier,
                        subscription_id,
                    },
                )
                .await?;
            info!("User {user_id} upgraded to {tier}");

            if was_free && tier != Tier::Free {
                state.email.send_upgrade_confirmation(&user.email, tier).await;
            }
        }
        WebhookEvent::SubscriptionUpdated {
            user_id,
            status,
            current_period_end,
        } => match user_id.as_deref().map(parse_user_id).transpose()? {
            Some(user_id) => {
                let found = state
                    .store
                    .apply_subscription_change(
                        user_id,
                        SubscriptionChange::Updated {
                            status,
                            current_period_end,
                        },
                    )
                    .await?;
                if !found {
                    warn!("Subscription update for unknown user {user_id}");
                }
            }
            None => warn!("Subscription update without userId metadata"),
        },
        WebhookEvent::SubscriptionDeleted { user_id } => {
            match user_id.as_deref().map(parse_user_id).transpose()? {
                Some(user_id) => {
                    state
                        .store
                        .apply_subscription_change(user_id, SubscriptionChange::Canceled)
                        .await?;
                    info!("User {user_id} downgraded to free");
                }
                None => warn!("Subscription deletion without userId metadata"),
            }
        }
        WebhookEvent::Other(event_type) => {
            info!("Unhandled webhook event type: {event_type}");
        }
    }

    Ok(Json(json!({ "received": true })))
}

/// A user id that is not a UUID cannot name an existing user.
fn parse_user_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("User not found".to_string()))
}
