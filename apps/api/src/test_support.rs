//! Shared fixtures for unit and router tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{body::Body, http::Request, Router};
use chrono::Utc;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::{Claims, SessionVerifier, SESSION_AUDIENCE};
use crate::billing::webhook::WebhookVerifier;
use crate::config::Config;
use crate::db::memory::MemoryStore;
use crate::email::EmailClient;
use crate::generation::format::OutputMode;
use crate::limits::RateLimiter;
use crate::llm_client::{CompletionProvider, CompletionRequest, LlmError};
use crate::routes::build_router;
use crate::state::AppState;

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const WEBHOOK_SECRET: &str = "whsec_test";

/// Session token as the auth provider would issue it, valid for an hour.
pub fn mint_token(user_id: Uuid) -> String {
    let claims = Claims {
        sub: user_id,
        exp: (Utc::now().timestamp() + 3600) as usize,
        aud: SESSION_AUDIENCE.to_string(),
        email: None,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

/// Completion provider that returns a canned reply and records every request.
pub struct ScriptedProvider {
    reply: Option<String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails as an upstream 500 would after retries.
    pub fn failing() -> Self {
        Self {
            reply: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request);
        match &self.reply {
            Some(reply) if reply.trim().is_empty() => Err(LlmError::EmptyContent),
            Some(reply) => Ok(reply.clone()),
            None => Err(LlmError::Api {
                status: 500,
                message: "upstream unavailable".to_string(),
            }),
        }
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        redis_url: None,
        openai_api_key: "sk-test".to_string(),
        openai_base_url: "http://127.0.0.1:1".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        stripe_webhook_secret: WEBHOOK_SECRET.to_string(),
        resend_api_key: None,
        app_url: "http://localhost:3000".to_string(),
        free_daily_limit: 10,
        output_mode: OutputMode::Labeled,
        port: 0,
        rust_log: "debug".to_string(),
    }
}

/// Full router over an in-memory store. Rate limiting and e-mail are off.
pub fn test_app(store: Arc<MemoryStore>, llm: Arc<ScriptedProvider>) -> Router {
    let config = test_config();
    build_router(AppState {
        store,
        llm,
        caption_format: config.output_mode.caption_format(),
        limiter: RateLimiter::default(),
        email: EmailClient::new(None, config.app_url.clone()),
        sessions: SessionVerifier::new(JWT_SECRET),
        webhooks: WebhookVerifier::new(WEBHOOK_SECRET),
        config,
    })
}

pub fn authed_json(method: &str, uri: &str, user_id: Uuid, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", mint_token(user_id)))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn authed(method: &str, uri: &str, user_id: Uuid) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", mint_token(user_id)))
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
