//! Notification delivery configuration.

use serde::{Deserialize, Serialize};

/// Dispatcher and external channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Upper bound for a single external channel call, in seconds.
    #[serde(default = "default_channel_timeout")]
    pub channel_timeout_seconds: u64,
    /// Telegram bot channel. Absent means the channel is not registered.
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            channel_timeout_seconds: default_channel_timeout(),
            telegram: None,
        }
    }
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Whether the channel is registered with the dispatcher.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Bot token issued by BotFather.
    pub bot_token: String,
    /// API base URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Chat used when a user has no chat id of their own.
    #[serde(default)]
    pub default_chat_id: Option<String>,
}

fn default_channel_timeout() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}
