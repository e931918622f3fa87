//! Term template entities.

pub mod model;

pub use model::{CreateTemplate, TermTemplate};
