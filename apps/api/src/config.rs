use anyhow::{Context, Result};

use crate::generation::format::OutputMode;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_FREE_DAILY_LIMIT: i32 = 10;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Hosted limiter. Rate limiting is skipped when unset.
    pub redis_url: Option<String>,
    pub openai_api_key: String,
    pub openai_base_url: String,
    /// HS256 secret used by the auth provider to sign session tokens.
    pub jwt_secret: String,
    pub stripe_webhook_secret: String,
    /// Upgrade e-mails are skipped when unset.
    pub resend_api_key: Option<String>,
    pub app_url: String,
    pub free_daily_limit: i32,
    pub output_mode: OutputMode,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let free_daily_limit = match optional_env("FREE_DAILY_LIMIT") {
            Some(raw) => raw
                .parse::<i32>()
                .ok()
                .filter(|limit| *limit > 0)
                .context("FREE_DAILY_LIMIT must be a positive integer")?,
            None => DEFAULT_FREE_DAILY_LIMIT,
        };

        let output_mode = match optional_env("CAPTION_OUTPUT_MODE") {
            Some(raw) => raw
                .parse::<OutputMode>()
                .map_err(anyhow::Error::msg)
                .context("CAPTION_OUTPUT_MODE must be 'labeled' or 'json'")?,
            None => OutputMode::Labeled,
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: optional_env("REDIS_URL"),
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_base_url: optional_env("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            jwt_secret: require_env("SUPABASE_JWT_SECRET")?,
            stripe_webhook_secret: require_env("STRIPE_WEBHOOK_SECRET")?,
            resend_api_key: optional_env("RESEND_API_KEY"),
            app_url: optional_env("APP_URL").unwrap_or_else(|| "http://localhost:3000".to_string()),
            free_daily_limit,
            output_mode,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
