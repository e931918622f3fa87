//! Term template management.

pub mod service;

pub use service::TermTemplateStore;
