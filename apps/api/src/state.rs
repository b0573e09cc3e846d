use std::sync::Arc;

use crate::auth::SessionVerifier;
use crate::billing::webhook::WebhookVerifier;
use crate::config::Config;
use crate::db::Store;
use crate::email::EmailClient;
use crate::generation::format::CaptionFormat;
use crate::generation::generator::CaptionGenerator;
use crate::limits::RateLimiter;
use crate::llm_client::CompletionProvider;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every external client is constructed once in `main` and passed in here.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Pluggable completion provider. Default: `LlmClient` (OpenAI).
    pub llm: Arc<dyn CompletionProvider>,
    /// Caption output contract, chosen by `CAPTION_OUTPUT_MODE`.
    pub caption_format: Arc<dyn CaptionFormat>,
    pub limiter: RateLimiter,
    pub email: EmailClient,
    pub sessions: SessionVerifier,
    pub webhooks: WebhookVerifier,
    pub config: Config,
}

impl AppState {
    pub fn caption_generator(&self) -> CaptionGenerator {
        CaptionGenerator {
            store: self.store.clone(),
            llm: self.llm.clone(),
            format: self.caption_format.clone(),
            free_daily_limit: self.config.free_daily_limit,
        }
    }
}
