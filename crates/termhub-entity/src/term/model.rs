//! Volunteer term entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use termhub_core::types::id::{TemplateId, TermId, UserId};

use super::signature::SignatureType;
use super::status::TermStatus;

/// A time-bound volunteer agreement signed by one teacher.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VolunteerTerm {
    /// Unique term identifier.
    pub id: TermId,
    /// The teacher who signed and owns the term.
    pub teacher_id: UserId,
    /// Template the term was signed against. Never changes.
    pub template_id: TemplateId,
    /// When the term was signed.
    pub signed_at: DateTime<Utc>,
    /// When the term stops being valid.
    pub expiration_date: DateTime<Utc>,
    /// Lifecycle status.
    pub status: TermStatus,
    /// Whether the expiry reminder has been delivered. Only ever goes true.
    pub reminder_sent: bool,
    /// IP address the term was signed from.
    pub ip_address: Option<String>,
    /// User-Agent or device description of the signer.
    pub device_info: Option<String>,
    /// Signature method.
    pub signature_type: SignatureType,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last modified.
    pub updated_at: DateTime<Utc>,
}

impl VolunteerTerm {
    /// Whether the term is active and not yet past its expiration date.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.status == TermStatus::Active && self.expiration_date >= now
    }

    /// Whole days from `now` until expiry (negative once past).
    pub fn days_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.expiration_date - now).num_days()
    }
}

/// A freshly signed term, ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewTerm {
    /// Pre-generated identifier.
    pub id: TermId,
    /// Signing teacher.
    pub teacher_id: UserId,
    /// Template being signed.
    pub template_id: TemplateId,
    /// Signing time.
    pub signed_at: DateTime<Utc>,
    /// Computed expiration date.
    pub expiration_date: DateTime<Utc>,
    /// Signer IP address.
    pub ip_address: Option<String>,
    /// Signer device description.
    pub device_info: Option<String>,
    /// Signature method.
    pub signature_type: SignatureType,
}

impl NewTerm {
    /// Materialize the row as it will be stored.
    pub fn into_term(self) -> VolunteerTerm {
        VolunteerTerm {
            id: self.id,
            teacher_id: self.teacher_id,
            template_id: self.template_id,
            signed_at: self.signed_at,
            expiration_date: self.expiration_date,
            status: TermStatus::Active,
            reminder_sent: false,
            ip_address: self.ip_address,
            device_info: self.device_info,
            signature_type: self.signature_type,
            created_at: self.signed_at,
            updated_at: self.signed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn term(expires_in_days: i64) -> VolunteerTerm {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        NewTerm {
            id: TermId::new(),
            teacher_id: UserId::new(),
            template_id: TemplateId::new(),
            signed_at: now,
            expiration_date: now + Duration::days(expires_in_days),
            ip_address: None,
            device_info: None,
            signature_type: SignatureType::Electronic,
        }
        .into_term()
    }

    #[test]
    fn test_new_term_starts_active() {
        let t = term(365);
        assert_eq!(t.status, TermStatus::Active);
        assert!(!t.reminder_sent);
    }

    #[test]
    fn test_validity_window() {
        let t = term(10);
        assert!(t.is_valid_at(t.signed_at));
        assert!(t.is_valid_at(t.expiration_date));
        assert!(!t.is_valid_at(t.expiration_date + Duration::seconds(1)));
        assert_eq!(t.days_until_expiry(t.signed_at), 10);
    }
}
