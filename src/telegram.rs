use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{error, warn};

use crate::error::{Result, RumError};
use crate::escape::EscapeDialect;
use crate::pipeline::ChatSink;
use crate::types::{Config, RetryPolicy, TelegramPayload};

const SEND_TIMEOUT: Duration = Duration::from_secs(15);

/// Result of a single failed send.
#[derive(Debug)]
enum SendFailure {
    /// Network error, rate limit or server error: worth another try.
    Retryable(String),
    /// The request itself was rejected; retrying would not help.
    Rejected(String),
}

pub struct TelegramClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
    dialect: EscapeDialect,
    retry: RetryPolicy,
}

impl TelegramClient {
    pub fn new(
        api_base: impl Into<String>,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
        dialect: EscapeDialect,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            dialect,
            retry,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            cfg.telegram_api_base.clone(),
            cfg.telegram_bot_token.clone(),
            cfg.telegram_chat_id.clone(),
            cfg.dialect,
            cfg.delivery_retry,
        )
    }

    fn send_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.bot_token
        )
    }

    /// Send `text`, retrying transient failures with exponential backoff.
    pub async fn send_message(&self, text: &str) -> Result<()> {
        let mut attempt = 1;
        loop {
            match self.try_send(text).await {
                Ok(()) => return Ok(()),
                Err(SendFailure::Rejected(message)) => {
                    error!("Telegram rejected message: {}", message);
                    return Err(RumError::Transport { attempts: attempt, message });
                }
                Err(SendFailure::Retryable(message)) if attempt >= self.retry.max_attempts => {
                    error!("Telegram delivery gave up after {} attempt(s): {}", attempt, message);
                    return Err(RumError::Transport { attempts: attempt, message });
                }
                Err(SendFailure::Retryable(message)) => {
                    let delay = self.retry.backoff_after(attempt);
                    warn!(
                        "Telegram delivery attempt {} failed ({}), retrying in {:?}",
                        attempt, message, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn try_send(&self, text: &str) -> std::result::Result<(), SendFailure> {
        let payload = TelegramPayload {
            chat_id: &self.chat_id,
            text,
            parse_mode: self.dialect.parse_mode(),
            disable_web_page_preview: true,
        };
        let res = self
            .http
            .post(self.send_url())
            .json(&payload)
            .timeout(SEND_TIMEOUT)
            .send()
            .await
            .map_err(|e| SendFailure::Retryable(format!("request failed: {}", e)))?;

        let status = res.status();
        if status.is_success() {
            return Ok(());
        }
        let body = res.text().await.unwrap_or_default();
        let message = format!("{} - {}", status, body);
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            Err(SendFailure::Retryable(message))
        } else {
            Err(SendFailure::Rejected(message))
        }
    }
}

#[async_trait]
impl ChatSink for TelegramClient {
    async fn deliver(&self, text: &str) -> Result<()> {
        self.send_message(text).await
    }
}
