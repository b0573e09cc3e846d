mod auth;
mod billing;
mod config;
mod db;
mod email;
mod errors;
mod generation;
mod library;
mod limits;
mod llm_client;
mod models;
mod research;
mod routes;
mod signups;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::SessionVerifier;
use crate::billing::webhook::WebhookVerifier;
use crate::config::Config;
use crate::db::{create_pool, postgres::PgStore};
use crate::email::EmailClient;
use crate::limits::RateLimiter;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CaptionFlow API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let pool = create_pool(&config.database_url).await?;

    // Initialize Redis (optional)
    let redis = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            info!("Redis client initialized");
            Some(client)
        }
        None => {
            warn!("REDIS_URL not set, rate limiting disabled");
            None
        }
    };

    // Initialize LLM client
    let llm = LlmClient::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
    )?;
    info!(
        "LLM client initialized (text: {}, vision: {})",
        llm_client::TEXT_MODEL,
        llm_client::VISION_MODEL
    );

    if config.resend_api_key.is_none() {
        warn!("RESEND_API_KEY not set, upgrade e-mails disabled");
    }
    info!("Caption output mode: {}", config.output_mode);

    // Build app state
    let state = AppState {
        store: Arc::new(PgStore::new(pool)),
        llm: Arc::new(llm),
        caption_format: config.output_mode.caption_format(),
        limiter: RateLimiter::new(redis),
        email: EmailClient::new(config.resend_api_key.clone(), config.app_url.clone()),
        sessions: SessionVerifier::new(&config.jwt_secret),
        webhooks: WebhookVerifier::new(config.stripe_webhook_secret.clone()),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to APP_URL once the web client is deployed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
