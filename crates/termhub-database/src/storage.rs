//! Storage traits for every TermHub table.
//!
//! Methods that change more than one row are atomic units: either every
//! write lands or none does. Services rely on this for the term and
//! template invariants instead of checking and then writing themselves.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use termhub_core::result::AppResult;
use termhub_core::types::id::{NotificationId, TemplateId, TermId, UserId};
use termhub_entity::history::{NewHistoryEntry, TermHistoryEntry};
use termhub_entity::notification::{ChannelKind, InAppNotification};
use termhub_entity::template::TermTemplate;
use termhub_entity::term::{NewTerm, TermStatus, VolunteerTerm};

/// Message used for every "teacher already has an active term" conflict.
pub const ACTIVE_TERM_EXISTS: &str = "active term exists";

/// Message used when a term is signed against a template that is not active.
pub const INACTIVE_TEMPLATE: &str = "inactive or unknown template";

/// Term template persistence.
#[async_trait]
pub trait TemplateStorage: Send + Sync + std::fmt::Debug {
    /// Find a template by id.
    async fn find_by_id(&self, id: TemplateId) -> AppResult<Option<TermTemplate>>;

    /// Find the active template, if any.
    async fn find_active(&self) -> AppResult<Option<TermTemplate>>;

    /// List all templates, newest first.
    async fn list(&self) -> AppResult<Vec<TermTemplate>>;

    /// Insert a template. When `template.is_active` is set, every other
    /// template is deactivated in the same atomic unit.
    async fn insert(&self, template: &TermTemplate) -> AppResult<TermTemplate>;

    /// Deactivate every template and activate `id`, atomically.
    ///
    /// Returns `false` (and changes nothing) if `id` does not exist.
    async fn activate(&self, id: TemplateId, at: DateTime<Utc>) -> AppResult<bool>;

    /// Delete a template no term references.
    ///
    /// Returns `false` if `id` does not exist and a conflict error if any
    /// term references it.
    async fn delete_unreferenced(&self, id: TemplateId) -> AppResult<bool>;
}

/// Volunteer term persistence.
#[async_trait]
pub trait TermStorage: Send + Sync + std::fmt::Debug {
    /// Find a term by id.
    async fn find_by_id(&self, id: TermId) -> AppResult<Option<VolunteerTerm>>;

    /// The teacher's active term, if any.
    async fn find_active_by_teacher(&self, teacher_id: UserId) -> AppResult<Option<VolunteerTerm>>;

    /// All terms of a teacher, newest first.
    async fn list_by_teacher(&self, teacher_id: UserId) -> AppResult<Vec<VolunteerTerm>>;

    /// Active terms whose expiration date is strictly before `now`.
    async fn find_active_expired_before(&self, now: DateTime<Utc>)
    -> AppResult<Vec<VolunteerTerm>>;

    /// Active terms expiring on or before `limit`, soonest first. With
    /// `unreminded_only`, terms that already got a reminder are skipped.
    async fn find_active_expiring_by(
        &self,
        limit: DateTime<Utc>,
        unreminded_only: bool,
    ) -> AppResult<Vec<VolunteerTerm>>;

    /// Insert a signed term and its `signed` history entry atomically.
    ///
    /// Fails with a conflict if the teacher already has an active term and
    /// with a validation error if the template is not the active one.
    async fn insert_signed(
        &self,
        term: NewTerm,
        entry: NewHistoryEntry,
    ) -> AppResult<VolunteerTerm>;

    /// Move an active term to `to` and append `entry`, atomically.
    ///
    /// Returns `None` when the term is missing or no longer active; nothing
    /// is written in that case.
    async fn transition(
        &self,
        id: TermId,
        to: TermStatus,
        entry: NewHistoryEntry,
    ) -> AppResult<Option<VolunteerTerm>>;

    /// Set `reminder_sent` on an active, unreminded term and append `entry`,
    /// atomically. Returns `false` when the term is not eligible.
    async fn mark_reminded(&self, id: TermId, entry: NewHistoryEntry) -> AppResult<bool>;
}

/// Append-only term history.
#[async_trait]
pub trait HistoryStorage: Send + Sync + std::fmt::Debug {
    /// Append one entry.
    async fn append(&self, entry: NewHistoryEntry) -> AppResult<TermHistoryEntry>;

    /// Entries of a term, newest first.
    async fn list_by_term(&self, term_id: TermId) -> AppResult<Vec<TermHistoryEntry>>;
}

/// In-app notification persistence.
#[async_trait]
pub trait NotificationStorage: Send + Sync + std::fmt::Debug {
    /// Store a notification.
    async fn insert(&self, notification: &InAppNotification) -> AppResult<()>;

    /// Notifications of a user, newest first.
    async fn list_for_user(
        &self,
        user_id: UserId,
        unread_only: bool,
        limit: i64,
    ) -> AppResult<Vec<InAppNotification>>;

    /// Number of unread notifications of a user.
    async fn count_unread(&self, user_id: UserId) -> AppResult<i64>;

    /// Mark one notification of `user_id` read. Returns `false` if no such
    /// notification belongs to the user.
    async fn mark_read(
        &self,
        id: NotificationId,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Mark every unread notification of a user read.
    async fn mark_all_read(&self, user_id: UserId, at: DateTime<Utc>) -> AppResult<u64>;
}

/// Where each user can be reached on external channels.
#[async_trait]
pub trait ChannelTargetDirectory: Send + Sync + std::fmt::Debug {
    /// The user's address on `channel`, if registered.
    async fn find_target(&self, user_id: UserId, channel: ChannelKind)
    -> AppResult<Option<String>>;

    /// Register or replace the user's address on `channel`.
    async fn upsert_target(
        &self,
        user_id: UserId,
        channel: ChannelKind,
        target: &str,
        at: DateTime<Utc>,
    ) -> AppResult<()>;
}
