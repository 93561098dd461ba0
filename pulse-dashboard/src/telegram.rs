//! Telegram Bot API notifications.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};
use thiserror::Error;
use tracing::{debug, warn};

/// Default Telegram Bot API base url.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Message sent by the dashboard "test Telegram" action.
pub const TEST_MESSAGE: &str = "*Pulse* test message: Telegram alerts are configured.";

/// Failure delivering a notification.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum NotifyError {
    #[error("HTTP: {0}")]
    Http(String),

    #[error("Telegram rejected message ({status}): {description}")]
    Rejected { status: u16, description: String },
}

impl From<reqwest::Error> for NotifyError {
    fn from(error: reqwest::Error) -> Self {
        // Request urls embed the bot token
        Self::Http(error.without_url().to_string())
    }
}

/// Destination for alert messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one Markdown formatted message.
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

/// Telegram credentials.
#[derive(Clone, PartialEq)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub api_base: String,
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            api_base: TELEGRAM_API_BASE.to_string(),
        }
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// [`Notifier`] posting to the Telegram Bot API `sendMessage` method.
#[derive(Debug)]
pub struct TelegramNotifier {
    http: reqwest::Client,
    config: TelegramConfig,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token
        )
    }

    fn payload<'a>(&'a self, text: &'a str) -> SendMessage<'a> {
        SendMessage {
            chat_id: &self.config.chat_id,
            text,
            parse_mode: "Markdown",
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let response = self
            .http
            .post(self.endpoint())
            .json(&self.payload(text))
            .send()
            .await?;

        let status = response.status();
        let body: ApiResponse = response.json().await?;
        if !status.is_success() || !body.ok {
            let description = body.description.unwrap_or_default();
            warn!(status = status.as_u16(), %description, "Telegram sendMessage failed");
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                description,
            });
        }

        debug!(chat_id = %self.config.chat_id, "Telegram message sent");
        Ok(())
    }
}
