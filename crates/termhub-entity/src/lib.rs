//! # termhub-entity
//!
//! Domain entity models for TermHub. Every struct in this crate represents
//! a database table row or a domain value object. Database entities derive
//! `sqlx::FromRow`; closed status fields are `sqlx::Type` enums backed by
//! PostgreSQL enum types.

pub mod history;
pub mod notification;
pub mod template;
pub mod term;
