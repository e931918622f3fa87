//! Telegram Bot API channel.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use termhub_core::config::TelegramConfig;
use termhub_entity::notification::ChannelKind;

use super::{ChannelAdapter, ChannelError};

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct BotResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends messages through a Telegram bot with `sendMessage`.
#[derive(Debug, Clone)]
pub struct TelegramChannel {
    client: Client,
    endpoint: String,
    default_chat_id: Option<String>,
}

impl TelegramChannel {
    /// Build the channel from its configuration section.
    pub fn new(config: &TelegramConfig, timeout: Duration) -> Result<Self, ChannelError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChannelError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: send_message_url(&config.api_base_url, &config.bot_token),
            default_chat_id: config.default_chat_id.clone(),
        })
    }
}

fn send_message_url(base: &str, token: &str) -> String {
    format!("{}/bot{}/sendMessage", base.trim_end_matches('/'), token)
}

#[async_trait]
impl ChannelAdapter for TelegramChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Chat
    }

    fn name(&self) -> &str {
        "telegram"
    }

    fn default_target(&self) -> Option<&str> {
        self.default_chat_id.as_deref()
    }

    async fn send(&self, target: &str, text: &str) -> Result<(), ChannelError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&SendMessage {
                chat_id: target,
                text,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChannelError::Timeout
                } else {
                    // The URL embeds the bot token.
                    ChannelError::Http(e.without_url().to_string())
                }
            })?;

        let status = response.status();
        let body: Option<BotResponse> = response.json().await.ok();
        match body {
            Some(BotResponse { ok: true, .. }) if status.is_success() => {
                debug!(chat_id = target, "Telegram message delivered");
                Ok(())
            }
            Some(BotResponse { description, .. }) => Err(ChannelError::Rejected {
                status: status.as_u16(),
                reason: description.unwrap_or_else(|| "no description".to_string()),
            }),
            None => Err(ChannelError::Rejected {
                status: status.as_u16(),
                reason: "unreadable response body".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_message_url() {
        assert_eq!(
            send_message_url("https://api.telegram.org/", "123:abc"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_default_target_from_config() {
        let config = TelegramConfig {
            enabled: true,
            bot_token: "123:abc".into(),
            api_base_url: "https://api.telegram.org".into(),
            default_chat_id: Some("-100200".into()),
        };
        let channel = TelegramChannel::new(&config, Duration::from_secs(5)).unwrap();
        assert_eq!(channel.default_target(), Some("-100200"));
        assert_eq!(channel.kind(), ChannelKind::Chat);
    }

    #[tokio::test]
    async fn test_unreachable_api_is_http_error() {
        let config = TelegramConfig {
            enabled: true,
            bot_token: "123:abc".into(),
            api_base_url: "http://127.0.0.1:9".into(),
            default_chat_id: None,
        };
        let channel = TelegramChannel::new(&config, Duration::from_secs(5)).unwrap();
        let err = channel.send("42", "hello").await.unwrap_err();
        assert!(matches!(err, ChannelError::Http(_) | ChannelError::Timeout));
    }
}
