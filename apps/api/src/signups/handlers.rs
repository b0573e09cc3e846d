use std::sync::OnceLock;

use axum::{extract::State, http::StatusCode, Json};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::{AppError, AppJson};
use crate::models::signup::NewWaitlistEntry;
use crate::state::AppState;

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

/// Trimmed and lowercased, so `Ana@X.io` and `ana@x.io` are one sign-up.
fn normalize_email(email: &str) -> Option<String> {
    let email = email.trim().to_lowercase();
    email_re().is_match(&email).then_some(email)
}

fn required(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

/// 8 random bytes as 16 upper-case hex characters.
fn invite_code() -> String {
    let id = Uuid::new_v4();
    hex::encode_upper(&id.as_bytes()[..8])
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct WaitlistRequest {
    pub email: String,
    pub handle: String,
    pub platform: String,
}

/// POST /api/waitlist
pub async fn handle_join_waitlist(
    State(state): State<AppState>,
    AppJson(request): AppJson<WaitlistRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    let email = normalize_email(&request.email)
        .ok_or_else(|| AppError::Validation("Valid email is required".to_string()))?;
    let entry = NewWaitlistEntry {
        email,
        handle: required("handle", &request.handle)?,
        platform: required("platform", &request.platform)?,
    };

    let Some(row) = state.store.join_waitlist(entry).await? else {
        return Err(AppError::Conflict(
            "This email is already on the waitlist.".to_string(),
        ));
    };
    info!("Waitlist sign-up {} from {}", row.id, row.platform);

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            success: None,
            message: "Successfully joined the waitlist!",
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct BetaRequest {
    #[serde(default)]
    pub email: String,
}

/// POST /api/beta
///
/// The invite e-mail is best effort; a failed send still returns success.
pub async fn handle_beta_signup(
    State(state): State<AppState>,
    AppJson(request): AppJson<BetaRequest>,
) -> Result<Json<SignupResponse>, AppError> {
    let email = normalize_email(&request.email)
        .ok_or_else(|| AppError::Validation("Valid email is required".to_string()))?;

    let code = invite_code();
    let Some(row) = state.store.create_beta_signup(&email, &code).await? else {
        return Err(AppError::Conflict(
            "Email already registered for beta".to_string(),
        ));
    };
    info!("Beta sign-up {} created", row.id);

    state.email.send_beta_invite(&row.email, &row.invite_code).await;

    Ok(Json(SignupResponse {
        success: Some(true),
        message: "Beta invite sent! Check your email.",
    }))
}
