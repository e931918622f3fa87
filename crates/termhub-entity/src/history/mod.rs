//! Term audit history entities.

pub mod action;
pub mod model;

pub use action::TermAction;
pub use model::{NewHistoryEntry, TermHistoryEntry};
