//! Notification domain entities.

pub mod channel;
pub mod data;
pub mod event;
pub mod model;
pub mod priority;
pub mod request;

pub use channel::{ChannelKind, ChannelTarget};
pub use data::NotificationData;
pub use model::InAppNotification;
pub use priority::NotificationPriority;
pub use request::NotificationRequest;
