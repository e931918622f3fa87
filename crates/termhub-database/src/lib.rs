//! # termhub-database
//!
//! Storage for TermHub. The storage traits in [`storage`] describe every
//! read and every atomic mutation the services need; [`repositories`]
//! implements them on PostgreSQL and [`memory`] implements them in process.

pub mod connection;
pub mod error;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod storage;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use storage::{
    ChannelTargetDirectory, HistoryStorage, NotificationStorage, TemplateStorage, TermStorage,
};
