//! # termhub-notify
//!
//! Notification delivery for TermHub: the in-app inbox, priority-based
//! channel routing, and the external channel adapters.

pub mod channel;
pub mod dispatcher;
pub mod formatter;
pub mod policy;
pub mod sender;

pub use channel::{ChannelAdapter, ChannelError, TelegramChannel};
pub use dispatcher::{ChannelDelivery, ChannelOutcome, DispatchReport, MultiDispatchReport, NotificationDispatcher};
pub use formatter::NotificationFormatter;
pub use sender::NotificationSender;
