//! Term lifecycle manager: sign, revoke, view, and lookups.

use std::sync::Arc;

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use termhub_core::config::TermsConfig;
use termhub_core::error::AppError;
use termhub_core::result::AppResult;
use termhub_core::traits::Clock;
use termhub_core::types::id::{TemplateId, TermId, UserId};
use termhub_database::storage::{ACTIVE_TERM_EXISTS, INACTIVE_TEMPLATE};
use termhub_database::{TemplateStorage, TermStorage};
use termhub_entity::history::{NewHistoryEntry, TermAction, TermHistoryEntry};
use termhub_entity::term::{NewTerm, SignatureType, TermStatus, VolunteerTerm};
use termhub_notify::{NotificationFormatter, NotificationSender};

use crate::audit::AuditTrail;
use crate::context::ActorContext;

/// Data needed to sign a term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignRequest {
    /// The signing teacher.
    pub teacher_id: UserId,
    /// Template being signed; must be the active one.
    pub template_id: TemplateId,
    /// Signer IP address.
    pub ip_address: Option<String>,
    /// Signer device description.
    pub device_info: Option<String>,
    /// Signature method.
    #[serde(default)]
    pub signature_type: SignatureType,
}

impl SignRequest {
    /// Build a request, taking the origin from `ctx`.
    pub fn new(
        teacher_id: UserId,
        template_id: TemplateId,
        ctx: &ActorContext,
        signature_type: SignatureType,
    ) -> Self {
        Self {
            teacher_id,
            template_id,
            ip_address: ctx.ip_address.clone(),
            device_info: ctx.device_info.clone(),
            signature_type,
        }
    }
}

/// Drives volunteer terms through `active -> {expired | revoked}`.
///
/// Every transition is written together with its history entry by the
/// term storage; this type decides which transitions to attempt.
#[derive(Debug, Clone)]
pub struct TermLifecycleManager {
    pub(crate) templates: Arc<dyn TemplateStorage>,
    pub(crate) terms: Arc<dyn TermStorage>,
    pub(crate) audit: AuditTrail,
    pub(crate) notifier: Arc<dyn NotificationSender>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: TermsConfig,
}

impl TermLifecycleManager {
    /// Create a new lifecycle manager.
    pub fn new(
        templates: Arc<dyn TemplateStorage>,
        terms: Arc<dyn TermStorage>,
        audit: AuditTrail,
        notifier: Arc<dyn NotificationSender>,
        clock: Arc<dyn Clock>,
        config: TermsConfig,
    ) -> Self {
        Self {
            templates,
            terms,
            audit,
            notifier,
            clock,
            config,
        }
    }

    /// Sign a term against the active template.
    ///
    /// The term expires `terms.validity_months` after signing. No
    /// notification is sent.
    pub async fn sign(&self, req: SignRequest) -> AppResult<VolunteerTerm> {
        let active = self.templates.find_active().await?;
        if active.as_ref().map(|t| t.id) != Some(req.template_id) {
            return Err(AppError::validation(INACTIVE_TEMPLATE));
        }
        if self.terms.find_active_by_teacher(req.teacher_id).await?.is_some() {
            return Err(AppError::conflict(ACTIVE_TERM_EXISTS));
        }

        let now = self.clock.now();
        let expiration_date = self.expiration_for(now)?;
        let term = NewTerm {
            id: TermId::new(),
            teacher_id: req.teacher_id,
            template_id: req.template_id,
            signed_at: now,
            expiration_date,
            ip_address: req.ip_address,
            device_info: req.device_info,
            signature_type: req.signature_type,
        };
        let entry = NewHistoryEntry::new(term.id, TermAction::Signed, now, Some(req.teacher_id));
        let signed = self.terms.insert_signed(term, entry).await?;

        info!(
            term_id = %signed.id,
            teacher_id = %signed.teacher_id,
            template_id = %signed.template_id,
            expires = %signed.expiration_date,
            "Volunteer term signed"
        );
        Ok(signed)
    }

    /// Revoke an active term.
    ///
    /// The teacher is told about it on a best-effort basis; a failed
    /// notification does not undo the revocation.
    pub async fn revoke(
        &self,
        term_id: TermId,
        reason: &str,
        actor_id: Option<UserId>,
    ) -> AppResult<VolunteerTerm> {
        let term = self.get_term(term_id).await?;
        if term.status != TermStatus::Active {
            return Err(AppError::validation("not active"));
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::validation("revocation reason must not be empty"));
        }

        let entry = NewHistoryEntry::new(term_id, TermAction::Revoked, self.clock.now(), actor_id)
            .with_details(reason);
        let revoked = self
            .terms
            .transition(term_id, TermStatus::Revoked, entry)
            .await?
            .ok_or_else(|| AppError::validation("not active"))?;

        info!(
            term_id = %term_id,
            teacher_id = %revoked.teacher_id,
            actor_id = ?actor_id,
            reason,
            "Volunteer term revoked"
        );

        let notice = NotificationFormatter::term_revoked(&revoked, reason);
        if let Err(e) = self.notifier.send_notification(notice).await {
            warn!(term_id = %term_id, error = %e, "Failed to notify teacher of revocation");
        }
        Ok(revoked)
    }

    /// Record that someone viewed a term.
    pub async fn record_view(
        &self,
        term_id: TermId,
        actor_id: Option<UserId>,
    ) -> AppResult<TermHistoryEntry> {
        self.get_term(term_id).await?;
        let entry = NewHistoryEntry::new(term_id, TermAction::Viewed, self.clock.now(), actor_id);
        self.audit.append(entry).await
    }

    /// Get a term by id.
    pub async fn get_term(&self, term_id: TermId) -> AppResult<VolunteerTerm> {
        self.terms
            .find_by_id(term_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Term {term_id} not found")))
    }

    /// The teacher's active term, if any.
    pub async fn get_active_term(&self, teacher_id: UserId) -> AppResult<Option<VolunteerTerm>> {
        self.terms.find_active_by_teacher(teacher_id).await
    }

    /// Every term the teacher signed, newest first.
    pub async fn list_for_teacher(&self, teacher_id: UserId) -> AppResult<Vec<VolunteerTerm>> {
        self.terms.list_by_teacher(teacher_id).await
    }

    /// Whether the teacher holds an active term that has not yet expired
    /// at `now`.
    pub async fn has_valid_term(&self, teacher_id: UserId, now: DateTime<Utc>) -> AppResult<bool> {
        Ok(self
            .terms
            .find_active_by_teacher(teacher_id)
            .await?
            .is_some_and(|t| t.is_valid_at(now)))
    }

    /// History of a term, newest first.
    pub async fn history(&self, term_id: TermId) -> AppResult<Vec<TermHistoryEntry>> {
        self.audit.list_by_term(term_id).await
    }

    fn expiration_for(&self, signed_at: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
        signed_at
            .checked_add_months(Months::new(self.config.validity_months))
            .ok_or_else(|| AppError::internal("term expiration date out of range"))
    }
}
