//! PostgreSQL implementations of the storage traits.

pub mod channel_target;
pub mod history;
pub mod notification;
pub mod template;
pub mod term;

pub use channel_target::ChannelTargetRepository;
pub use history::TermHistoryRepository;
pub use notification::NotificationRepository;
pub use template::TemplateRepository;
pub use term::TermRepository;
