//! Term audit history.

pub mod trail;

pub use trail::AuditTrail;
