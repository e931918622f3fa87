//! Core type definitions used across the TermHub workspace.

pub mod id;

pub use id::*;
