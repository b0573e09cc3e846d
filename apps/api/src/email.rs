//! Transactional e-mail through the Resend HTTP API. Best effort: failures
//! are logged and never fail the calling request.

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::billing::tier::Tier;

const RESEND_API_URL: &str = "https://api.resend.com/emails";
const FROM_ADDRESS: &str = "CaptionFlow <hello@captionflow.app>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
struct SendEmail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
}

/// Sent after a free user completes checkout.
pub fn upgrade_confirmation(tier: Tier, app_url: &str) -> EmailMessage {
    let name = match tier {
        Tier::Free => "Free",
        Tier::Pro => "Pro",
        Tier::Team => "Team",
    };
    EmailMessage {
        subject: format!("Welcome to CaptionFlow {name}! 🎊"),
        text: format!(
            "Thanks for upgrading to CaptionFlow {name}.\n\n\
             Your account now includes unlimited caption generation, viral-optimized \
             captions, brand voice training, competitor research and post scheduling.\n\n\
             Start creating: {}/dashboard\n",
            app_url.trim_end_matches('/')
        ),
    }
}

/// Carries the invite code and a sign-up link that pre-fills it.
pub fn beta_invite(invite_code: &str, app_url: &str) -> EmailMessage {
    EmailMessage {
        subject: "Your CaptionFlow Beta Access 🚀".to_string(),
        text: format!(
            "You're in! You've been selected for the CaptionFlow beta program, with \
             unlimited access to all Pro features during the beta period.\n\n\
             Your beta invite code: {invite_code}\n\n\
             Create your account: {}/register?code={invite_code}\n",
            app_url.trim_end_matches('/')
        ),
    }
}

#[derive(Clone)]
pub struct EmailClient {
    http: Client,
    api_key: Option<String>,
    app_url: String,
    endpoint: String,
}

impl EmailClient {
    pub fn new(api_key: Option<String>, app_url: String) -> Self {
        Self {
            http: Client::new(),
            api_key,
            app_url,
            endpoint: RESEND_API_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub async fn send_upgrade_confirmation(&self, to: &str, tier: Tier) {
        let message = upgrade_confirmation(tier, &self.app_url);
        if let Err(e) = self.send(to, &message).await {
            warn!("Failed to send upgrade email: {e}");
        }
    }

    pub async fn send_beta_invite(&self, to: &str, invite_code: &str) {
        let message = beta_invite(invite_code, &self.app_url);
        if let Err(e) = self.send(to, &message).await {
            warn!("Failed to send beta invite: {e}");
        }
    }

    async fn send(&self, to: &str, message: &EmailMessage) -> Result<(), reqwest::Error> {
        let Some(api_key) = &self.api_key else {
            debug!("E-mail disabled, skipping '{}'", message.subject);
            return Ok(());
        };

        self.http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&SendEmail {
                from: FROM_ADDRESS,
                to: [to],
                subject: &message.subject,
                text: &message.text,
            })
            .send()
            .await?
            .error_for_status()?;

        info!("Sent '{}' e-mail", message.subject);
        Ok(())
    }
}
