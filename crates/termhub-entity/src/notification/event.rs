//! Well-known notification event types.

/// A volunteer term is about to expire.
pub const TERM_EXPIRING: &str = "volunteer_term.expiring";

/// A volunteer term was revoked.
pub const TERM_REVOKED: &str = "volunteer_term.revoked";

/// Free-form message sent by an administrator.
pub const ADMIN_MESSAGE: &str = "admin.message";
