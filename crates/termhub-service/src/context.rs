//! Identity context supplied by callers.

use serde::{Deserialize, Serialize};

use termhub_core::types::id::UserId;

/// Who is acting, and from where.
///
/// Built by the caller (an HTTP layer, the CLI, a scheduled job) and
/// passed into service methods that record an actor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActorContext {
    /// Acting user. `None` for system jobs.
    pub actor_id: Option<UserId>,
    /// IP address of the request origin.
    pub ip_address: Option<String>,
    /// User-Agent or other device description.
    pub device_info: Option<String>,
}

impl ActorContext {
    /// Context for an automated job with no user behind it.
    pub fn system() -> Self {
        Self::default()
    }

    /// Context for a user.
    pub fn user(actor_id: UserId) -> Self {
        Self {
            actor_id: Some(actor_id),
            ..Self::default()
        }
    }

    /// Attach the request origin.
    pub fn with_ip(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }

    /// Attach the device description.
    pub fn with_device(mut self, device_info: impl Into<String>) -> Self {
        self.device_info = Some(device_info.into());
        self
    }

    /// Whether this is a system context.
    pub fn is_system(&self) -> bool {
        self.actor_id.is_none()
    }
}
