//! External delivery channels.
//!
//! A [`ChannelAdapter`] pushes plain text to one address on one medium.
//! Adapters are built from configuration and handed to the dispatcher;
//! none of them are global.

pub mod telegram;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use termhub_core::config::NotificationsConfig;
use termhub_core::error::AppError;
use termhub_entity::notification::ChannelKind;

pub use telegram::TelegramChannel;

/// Errors from a single channel delivery attempt.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChannelError {
    /// The call did not finish within the configured timeout.
    #[error("channel timeout")]
    Timeout,

    /// Transport-level failure (connect, TLS, body decode).
    #[error("http error: {0}")]
    Http(String),

    /// The remote service answered but refused the message.
    #[error("rejected ({status}): {reason}")]
    Rejected {
        /// HTTP status code returned by the service.
        status: u16,
        /// Description given by the service.
        reason: String,
    },

    /// The channel cannot be used (misconfigured, client not built).
    #[error("channel unavailable: {0}")]
    Unavailable(String),
}

impl From<ChannelError> for AppError {
    fn from(err: ChannelError) -> Self {
        AppError::with_source(
            termhub_core::error::ErrorKind::ChannelDelivery,
            format!("Channel delivery failed: {err}"),
            err,
        )
    }
}

/// One external delivery medium.
#[async_trait]
pub trait ChannelAdapter: Send + Sync + std::fmt::Debug {
    /// Which medium this adapter delivers to.
    fn kind(&self) -> ChannelKind;

    /// Adapter name used in logs and dispatch reports (e.g. `"telegram"`).
    fn name(&self) -> &str;

    /// Address used when a user has no registered target on this medium.
    fn default_target(&self) -> Option<&str> {
        None
    }

    /// Deliver `text` to `target`.
    async fn send(&self, target: &str, text: &str) -> Result<(), ChannelError>;
}

/// Build every adapter enabled in `config`.
///
/// Each adapter's HTTP client uses the channel timeout as well, so a stuck
/// connection is cut even outside the dispatcher.
pub fn build_adapters(config: &NotificationsConfig) -> Result<Vec<Arc<dyn ChannelAdapter>>, AppError> {
    let timeout = Duration::from_secs(config.channel_timeout_seconds);
    let mut adapters: Vec<Arc<dyn ChannelAdapter>> = Vec::new();

    if let Some(telegram) = config.telegram.as_ref().filter(|t| t.enabled) {
        if telegram.bot_token.trim().is_empty() {
            return Err(AppError::configuration(
                "notifications.telegram.bot_token must be set when telegram is enabled",
            ));
        }
        adapters.push(Arc::new(TelegramChannel::new(telegram, timeout)?));
        info!(channel = "telegram", "Registered notification channel");
    }

    Ok(adapters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use termhub_core::config::TelegramConfig;
    use termhub_core::error::ErrorKind;

    fn telegram(enabled: bool, token: &str) -> TelegramConfig {
        TelegramConfig {
            enabled,
            bot_token: token.to_string(),
            api_base_url: "https://api.telegram.org".to_string(),
            default_chat_id: None,
        }
    }

    #[test]
    fn test_no_adapters_by_default() {
        let adapters = build_adapters(&NotificationsConfig::default()).unwrap();
        assert!(adapters.is_empty());
    }

    #[test]
    fn test_disabled_telegram_is_skipped() {
        let config = NotificationsConfig {
            channel_timeout_seconds: 10,
            telegram: Some(telegram(false, "123:abc")),
        };
        assert!(build_adapters(&config).unwrap().is_empty());
    }

    #[test]
    fn test_enabled_telegram_needs_token() {
        let config = NotificationsConfig {
            channel_timeout_seconds: 10,
            telegram: Some(telegram(true, " ")),
        };
        let err = build_adapters(&config).unwrap_err();
        assert!(err.is(ErrorKind::Configuration));

        let config = NotificationsConfig {
            channel_timeout_seconds: 10,
            telegram: Some(telegram(true, "123:abc")),
        };
        let adapters = build_adapters(&config).unwrap();
        assert_eq!(adapters.len(), 1);
        assert_eq!(adapters[0].kind(), ChannelKind::Chat);
        assert_eq!(adapters[0].name(), "telegram");
    }

    #[test]
    fn test_channel_error_maps_to_delivery_kind() {
        let err: AppError = ChannelError::Timeout.into();
        assert!(err.is(ErrorKind::ChannelDelivery));
    }
}
