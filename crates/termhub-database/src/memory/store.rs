//! In-memory implementation of every storage trait.
//!
//! All tables live behind one mutex, so each multi-row mutation is a single
//! critical section and observes the same invariants the PostgreSQL
//! constraints enforce.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use termhub_core::error::AppError;
use termhub_core::result::AppResult;
use termhub_core::types::id::{NotificationId, TemplateId, TermId, UserId};
use termhub_entity::history::{NewHistoryEntry, TermHistoryEntry};
use termhub_entity::notification::{ChannelKind, InAppNotification};
use termhub_entity::template::TermTemplate;
use termhub_entity::term::{NewTerm, TermStatus, VolunteerTerm};

use crate::storage::{
    ACTIVE_TERM_EXISTS, ChannelTargetDirectory, HistoryStorage, INACTIVE_TEMPLATE,
    NotificationStorage, TemplateStorage, TermStorage,
};

/// A stored row plus its insertion sequence, used to break timestamp ties.
#[derive(Debug, Clone)]
struct Row<T> {
    seq: u64,
    value: T,
}

#[derive(Debug, Default)]
struct State {
    next_seq: u64,
    templates: Vec<Row<TermTemplate>>,
    terms: Vec<Row<VolunteerTerm>>,
    history: Vec<Row<TermHistoryEntry>>,
    notifications: Vec<Row<InAppNotification>>,
    targets: HashMap<(UserId, ChannelKind), String>,
}

impl State {
    fn seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn push_history(&mut self, entry: NewHistoryEntry) -> TermHistoryEntry {
        let row = entry.into_entry();
        let seq = self.seq();
        self.history.push(Row {
            seq,
            value: row.clone(),
        });
        row
    }

    fn term_mut(&mut self, id: TermId) -> Option<&mut VolunteerTerm> {
        self.terms
            .iter_mut()
            .map(|r| &mut r.value)
            .find(|t| t.id == id)
    }
}

/// Storage backend holding everything in process memory.
///
/// Cloning shares the underlying tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn newest_first<T: Clone>(rows: &[Row<T>], key: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    let mut sorted: Vec<&Row<T>> = rows.iter().collect();
    sorted.sort_by(|a, b| {
        key(&b.value)
            .cmp(&key(&a.value))
            .then(b.seq.cmp(&a.seq))
    });
    sorted.into_iter().map(|r| r.value.clone()).collect()
}

#[async_trait]
impl TemplateStorage for MemoryStore {
    async fn find_by_id(&self, id: TemplateId) -> AppResult<Option<TermTemplate>> {
        let state = self.lock();
        Ok(state
            .templates
            .iter()
            .find(|r| r.value.id == id)
            .map(|r| r.value.clone()))
    }

    async fn find_active(&self) -> AppResult<Option<TermTemplate>> {
        let state = self.lock();
        Ok(state
            .templates
            .iter()
            .find(|r| r.value.is_active)
            .map(|r| r.value.clone()))
    }

    async fn list(&self) -> AppResult<Vec<TermTemplate>> {
        let state = self.lock();
        Ok(newest_first(&state.templates, |t| t.created_at))
    }

    async fn insert(&self, template: &TermTemplate) -> AppResult<TermTemplate> {
        let mut state = self.lock();
        if state.templates.iter().any(|r| r.value.id == template.id) {
            return Err(AppError::conflict(format!(
                "template {} already exists",
                template.id
            )));
        }
        if template.is_active {
            for row in state.templates.iter_mut().filter(|r| r.value.is_active) {
                row.value.is_active = false;
                row.value.updated_at = template.created_at;
            }
        }
        let seq = state.seq();
        state.templates.push(Row {
            seq,
            value: template.clone(),
        });
        Ok(template.clone())
    }

    async fn activate(&self, id: TemplateId, at: DateTime<Utc>) -> AppResult<bool> {
        let mut state = self.lock();
        if !state.templates.iter().any(|r| r.value.id == id) {
            return Ok(false);
        }
        for row in state.templates.iter_mut() {
            let should_be_active = row.value.id == id;
            if row.value.is_active != should_be_active {
                row.value.is_active = should_be_active;
                row.value.updated_at = at;
            }
        }
        Ok(true)
    }

    async fn delete_unreferenced(&self, id: TemplateId) -> AppResult<bool> {
        let mut state = self.lock();
        let Some(index) = state.templates.iter().position(|r| r.value.id == id) else {
            return Ok(false);
        };
        if state.terms.iter().any(|r| r.value.template_id == id) {
            return Err(AppError::conflict("template is referenced by signed terms"));
        }
        state.templates.remove(index);
        Ok(true)
    }
}

#[async_trait]
impl TermStorage for MemoryStore {
    async fn find_by_id(&self, id: TermId) -> AppResult<Option<VolunteerTerm>> {
        let state = self.lock();
        Ok(state
            .terms
            .iter()
            .find(|r| r.value.id == id)
            .map(|r| r.value.clone()))
    }

    async fn find_active_by_teacher(&self, teacher_id: UserId) -> AppResult<Option<VolunteerTerm>> {
        let state = self.lock();
        Ok(state
            .terms
            .iter()
            .map(|r| &r.value)
            .find(|t| t.teacher_id == teacher_id && t.status == TermStatus::Active)
            .cloned())
    }

    async fn list_by_teacher(&self, teacher_id: UserId) -> AppResult<Vec<VolunteerTerm>> {
        let state = self.lock();
        let mut terms = newest_first(&state.terms, |t| t.signed_at);
        terms.retain(|t| t.teacher_id == teacher_id);
        Ok(terms)
    }

    async fn find_active_expired_before(
        &self,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<VolunteerTerm>> {
        let state = self.lock();
        let mut terms: Vec<VolunteerTerm> = state
            .terms
            .iter()
            .map(|r| &r.value)
            .filter(|t| t.status == TermStatus::Active && t.expiration_date < now)
            .cloned()
            .collect();
        terms.sort_by_key(|t| t.expiration_date);
        Ok(terms)
    }

    async fn find_active_expiring_by(
        &self,
        limit: DateTime<Utc>,
        unreminded_only: bool,
    ) -> AppResult<Vec<VolunteerTerm>> {
        let state = self.lock();
        let mut terms: Vec<VolunteerTerm> = state
            .terms
            .iter()
            .map(|r| &r.value)
            .filter(|t| t.status == TermStatus::Active && t.expiration_date <= limit)
            .filter(|t| !unreminded_only || !t.reminder_sent)
            .cloned()
            .collect();
        terms.sort_by_key(|t| t.expiration_date);
        Ok(terms)
    }

    async fn insert_signed(
        &self,
        term: NewTerm,
        entry: NewHistoryEntry,
    ) -> AppResult<VolunteerTerm> {
        let mut state = self.lock();
        let template_active = state
            .templates
            .iter()
            .any(|r| r.value.id == term.template_id && r.value.is_active);
        if !template_active {
            return Err(AppError::validation(INACTIVE_TEMPLATE));
        }
        let has_active = state
            .terms
            .iter()
            .any(|r| r.value.teacher_id == term.teacher_id && r.value.status == TermStatus::Active);
        if has_active {
            return Err(AppError::conflict(ACTIVE_TERM_EXISTS));
        }

        let row = term.into_term();
        let seq = state.seq();
        state.terms.push(Row {
            seq,
            value: row.clone(),
        });
        state.push_history(entry);
        Ok(row)
    }

    async fn transition(
        &self,
        id: TermId,
        to: TermStatus,
        entry: NewHistoryEntry,
    ) -> AppResult<Option<VolunteerTerm>> {
        if !TermStatus::Active.can_transition_to(to) {
            return Err(AppError::validation(format!("illegal transition to '{to}'")));
        }
        let mut state = self.lock();
        let updated = match state.term_mut(id) {
            Some(term) if term.status == TermStatus::Active => {
                term.status = to;
                term.updated_at = entry.action_date;
                term.clone()
            }
            _ => {
                debug!(term_id = %id, to = %to, "Term not active, transition skipped");
                return Ok(None);
            }
        };
        state.push_history(entry);
        Ok(Some(updated))
    }

    async fn mark_reminded(&self, id: TermId, entry: NewHistoryEntry) -> AppResult<bool> {
        let mut state = self.lock();
        match state.term_mut(id) {
            Some(term) if term.status == TermStatus::Active && !term.reminder_sent => {
                term.reminder_sent = true;
                term.updated_at = entry.action_date;
            }
            _ => return Ok(false),
        }
        state.push_history(entry);
        Ok(true)
    }
}

#[async_trait]
impl HistoryStorage for MemoryStore {
    async fn append(&self, entry: NewHistoryEntry) -> AppResult<TermHistoryEntry> {
        let mut state = self.lock();
        if !state.terms.iter().any(|r| r.value.id == entry.term_id) {
            return Err(AppError::database(format!(
                "history entry references unknown term {}",
                entry.term_id
            )));
        }
        Ok(state.push_history(entry))
    }

    async fn list_by_term(&self, term_id: TermId) -> AppResult<Vec<TermHistoryEntry>> {
        let state = self.lock();
        let mut entries = newest_first(&state.history, |e| e.action_date);
        entries.retain(|e| e.term_id == term_id);
        Ok(entries)
    }
}

#[async_trait]
impl NotificationStorage for MemoryStore {
    async fn insert(&self, notification: &InAppNotification) -> AppResult<()> {
        let mut state = self.lock();
        let seq = state.seq();
        state.notifications.push(Row {
            seq,
            value: notification.clone(),
        });
        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        unread_only: bool,
        limit: i64,
    ) -> AppResult<Vec<InAppNotification>> {
        let state = self.lock();
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        Ok(newest_first(&state.notifications, |n| n.created_at)
            .into_iter()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.read))
            .take(limit)
            .collect())
    }

    async fn count_unread(&self, user_id: UserId) -> AppResult<i64> {
        let state = self.lock();
        let count = state
            .notifications
            .iter()
            .filter(|r| r.value.user_id == user_id && !r.value.read)
            .count();
        Ok(count as i64)
    }

    async fn mark_read(
        &self,
        id: NotificationId,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut state = self.lock();
        let found = state
            .notifications
            .iter_mut()
            .map(|r| &mut r.value)
            .find(|n| n.id == id && n.user_id == user_id);
        match found {
            Some(n) => {
                if !n.read {
                    n.read = true;
                    n.read_at = Some(at);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, user_id: UserId, at: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.lock();
        let mut count = 0;
        for n in state
            .notifications
            .iter_mut()
            .map(|r| &mut r.value)
            .filter(|n| n.user_id == user_id && !n.read)
        {
            n.read = true;
            n.read_at = Some(at);
            count += 1;
        }
        Ok(count)
    }
}

#[async_trait]
impl ChannelTargetDirectory for MemoryStore {
    async fn find_target(
        &self,
        user_id: UserId,
        channel: ChannelKind,
    ) -> AppResult<Option<String>> {
        let state = self.lock();
        Ok(state.targets.get(&(user_id, channel)).cloned())
    }

    async fn upsert_target(
        &self,
        user_id: UserId,
        channel: ChannelKind,
        target: &str,
        _at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut state = self.lock();
        state.targets.insert((user_id, channel), target.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use termhub_core::error::ErrorKind;
    use termhub_entity::history::TermAction;
    use termhub_entity::notification::{NotificationPriority, NotificationRequest};
    use termhub_entity::term::SignatureType;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn template(active: bool, at: DateTime<Utc>) -> TermTemplate {
        TermTemplate {
            id: TemplateId::new(),
            title: "Agreement".into(),
            content: "Text".into(),
            version: "v1".into(),
            is_active: active,
            created_by: None,
            created_at: at,
            updated_at: at,
        }
    }

    fn new_term(teacher: UserId, template: TemplateId, days: i64) -> (NewTerm, NewHistoryEntry) {
        let id = TermId::new();
        let term = NewTerm {
            id,
            teacher_id: teacher,
            template_id: template,
            signed_at: t0(),
            expiration_date: t0() + Duration::days(days),
            ip_address: None,
            device_info: None,
            signature_type: SignatureType::Electronic,
        };
        let entry = NewHistoryEntry::new(id, TermAction::Signed, t0(), Some(teacher));
        (term, entry)
    }

    #[tokio::test]
    async fn test_insert_active_template_deactivates_others() {
        let store = MemoryStore::new();
        let first = TemplateStorage::insert(&store, &template(true, t0())).await.unwrap();
        let second = TemplateStorage::insert(&store, &template(true, t0() + Duration::days(1)))
            .await
            .unwrap();

        let active = store.find_active().await.unwrap().unwrap();
        assert_eq!(active.id, second.id);
        let first = TemplateStorage::find_by_id(&store, first.id).await.unwrap().unwrap();
        assert!(!first.is_active);
    }

    #[tokio::test]
    async fn test_activate_unknown_template_changes_nothing() {
        let store = MemoryStore::new();
        let active = TemplateStorage::insert(&store, &template(true, t0())).await.unwrap();
        assert!(!store.activate(TemplateId::new(), t0()).await.unwrap());
        assert_eq!(store.find_active().await.unwrap().unwrap().id, active.id);
    }

    #[tokio::test]
    async fn test_insert_signed_enforces_single_active_term() {
        let store = MemoryStore::new();
        let tpl = TemplateStorage::insert(&store, &template(true, t0())).await.unwrap();
        let teacher = UserId::new();

        let (term, entry) = new_term(teacher, tpl.id, 365);
        store.insert_signed(term, entry).await.unwrap();

        let (term, entry) = new_term(teacher, tpl.id, 365);
        let err = store.insert_signed(term, entry).await.unwrap_err();
        assert!(err.is(ErrorKind::Conflict));
        assert_eq!(store.list_by_teacher(teacher).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_insert_signed_requires_active_template() {
        let store = MemoryStore::new();
        let tpl = TemplateStorage::insert(&store, &template(false, t0())).await.unwrap();
        let (term, entry) = new_term(UserId::new(), tpl.id, 365);
        let err = store.insert_signed(term, entry).await.unwrap_err();
        assert!(err.is(ErrorKind::Validation));
    }

    #[tokio::test]
    async fn test_transition_only_from_active() {
        let store = MemoryStore::new();
        let tpl = TemplateStorage::insert(&store, &template(true, t0())).await.unwrap();
        let teacher = UserId::new();
        let (term, entry) = new_term(teacher, tpl.id, 365);
        let term = store.insert_signed(term, entry).await.unwrap();

        let revoke = NewHistoryEntry::new(term.id, TermAction::Revoked, t0(), None);
        let revoked = store
            .transition(term.id, TermStatus::Revoked, revoke.clone())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(revoked.status, TermStatus::Revoked);

        assert!(
            store
                .transition(term.id, TermStatus::Revoked, revoke)
                .await
                .unwrap()
                .is_none()
        );
        // signed + revoked, nothing more
        assert_eq!(store.list_by_term(term.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_referenced_template_conflicts() {
        let store = MemoryStore::new();
        let tpl = TemplateStorage::insert(&store, &template(true, t0())).await.unwrap();
        let (term, entry) = new_term(UserId::new(), tpl.id, 365);
        store.insert_signed(term, entry).await.unwrap();

        let err = store.delete_unreferenced(tpl.id).await.unwrap_err();
        assert!(err.is(ErrorKind::Conflict));
        assert!(!store.delete_unreferenced(TemplateId::new()).await.unwrap());
    }

    #[tokio::test]
    async fn test_history_ties_broken_by_insertion_order() {
        let store = MemoryStore::new();
        let tpl = TemplateStorage::insert(&store, &template(true, t0())).await.unwrap();
        let (term, entry) = new_term(UserId::new(), tpl.id, 365);
        let term = store.insert_signed(term, entry).await.unwrap();
        store
            .append(NewHistoryEntry::new(term.id, TermAction::Viewed, t0(), None))
            .await
            .unwrap();

        let entries = store.list_by_term(term.id).await.unwrap();
        assert_eq!(entries[0].action_type, TermAction::Viewed);
        assert_eq!(entries[1].action_type, TermAction::Signed);
    }

    #[tokio::test]
    async fn test_mark_reminded_once() {
        let store = MemoryStore::new();
        let tpl = TemplateStorage::insert(&store, &template(true, t0())).await.unwrap();
        let (term, entry) = new_term(UserId::new(), tpl.id, 10);
        let term = store.insert_signed(term, entry).await.unwrap();

        let reminder = NewHistoryEntry::new(term.id, TermAction::ReminderSent, t0(), None);
        assert!(store.mark_reminded(term.id, reminder.clone()).await.unwrap());
        assert!(!store.mark_reminded(term.id, reminder).await.unwrap());
        assert!(
            store
                .find_active_expiring_by(t0() + Duration::days(30), true)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_mark_read_scoped_to_owner() {
        let store = MemoryStore::new();
        let owner = UserId::new();
        let request = NotificationRequest::new(
            owner,
            "admin.message",
            "Hello",
            "Body",
            NotificationPriority::Low,
        );
        let n = InAppNotification::from_request(&request, t0());
        NotificationStorage::insert(&store, &n).await.unwrap();

        assert!(!store.mark_read(n.id, UserId::new(), t0()).await.unwrap());
        assert_eq!(store.count_unread(owner).await.unwrap(), 1);
        assert!(store.mark_read(n.id, owner, t0()).await.unwrap());
        assert_eq!(store.count_unread(owner).await.unwrap(), 0);
    }
}
