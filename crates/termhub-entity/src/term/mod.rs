//! Volunteer term entities.

pub mod model;
pub mod signature;
pub mod status;

pub use model::{NewTerm, VolunteerTerm};
pub use signature::SignatureType;
pub use status::TermStatus;
