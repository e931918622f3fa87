//! Term template store.

use std::sync::Arc;

use tracing::info;
use validator::Validate;

use termhub_core::error::AppError;
use termhub_core::result::AppResult;
use termhub_core::traits::Clock;
use termhub_core::types::id::TemplateId;
use termhub_database::TemplateStorage;
use termhub_entity::template::{CreateTemplate, TermTemplate};

/// Creates, activates, and deletes term templates.
///
/// At most one template is active; activation swaps it atomically.
#[derive(Debug, Clone)]
pub struct TermTemplateStore {
    storage: Arc<dyn TemplateStorage>,
    clock: Arc<dyn Clock>,
}

impl TermTemplateStore {
    /// Create a new template store.
    pub fn new(storage: Arc<dyn TemplateStorage>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Create a template, optionally making it the active one.
    pub async fn create_template(&self, req: CreateTemplate) -> AppResult<TermTemplate> {
        let req = req.normalized();
        req.validate()
            .map_err(|e| AppError::validation(format!("Invalid template: {e}")))?;

        let now = self.clock.now();
        let template = TermTemplate {
            id: TemplateId::new(),
            title: req.title,
            content: req.content,
            version: req.version,
            is_active: req.make_active,
            created_by: req.created_by,
            created_at: now,
            updated_at: now,
        };
        let created = self.storage.insert(&template).await?;

        info!(
            template_id = %created.id,
            version = %created.version,
            active = created.is_active,
            "Term template created"
        );
        Ok(created)
    }

    /// The active template.
    pub async fn get_active(&self) -> AppResult<TermTemplate> {
        self.storage
            .find_active()
            .await?
            .ok_or_else(|| AppError::not_found("no active template"))
    }

    /// Make `id` the active template. Already active is a no-op.
    pub async fn set_active(&self, id: TemplateId) -> AppResult<TermTemplate> {
        let current = self.get(id).await?;
        if current.is_active {
            return Ok(current);
        }
        if !self.storage.activate(id, self.clock.now()).await? {
            return Err(template_not_found(id));
        }
        info!(template_id = %id, "Term template activated");
        self.get(id).await
    }

    /// Delete a template no signed term references.
    pub async fn delete(&self, id: TemplateId) -> AppResult<()> {
        if !self.storage.delete_unreferenced(id).await? {
            return Err(template_not_found(id));
        }
        info!(template_id = %id, "Term template deleted");
        Ok(())
    }

    /// Get a template by id.
    pub async fn get(&self, id: TemplateId) -> AppResult<TermTemplate> {
        self.storage
            .find_by_id(id)
            .await?
            .ok_or_else(|| template_not_found(id))
    }

    /// All templates, newest first.
    pub async fn list(&self) -> AppResult<Vec<TermTemplate>> {
        self.storage.list().await
    }
}

fn template_not_found(id: TemplateId) -> AppError {
    AppError::not_found(format!("Template {id} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use termhub_core::error::ErrorKind;
    use termhub_core::traits::ManualClock;
    use termhub_database::MemoryStore;

    fn store() -> (TermTemplateStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        ));
        (
            TermTemplateStore::new(Arc::new(MemoryStore::new()), clock.clone()),
            clock,
        )
    }

    fn create(version: &str, make_active: bool) -> CreateTemplate {
        CreateTemplate {
            title: "Volunteer Agreement".into(),
            content: "I agree to volunteer.".into(),
            version: version.into(),
            make_active,
            created_by: None,
        }
    }

    #[tokio::test]
    async fn test_no_active_template() {
        let (templates, _) = store();
        let err = templates.get_active().await.unwrap_err();
        assert!(err.is(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_activation_swaps_active_template() {
        let (templates, clock) = store();
        let v1 = templates.create_template(create("v1", true)).await.unwrap();
        clock.advance(Duration::days(1));
        let v2 = templates.create_template(create("v2", false)).await.unwrap();
        assert_eq!(templates.get_active().await.unwrap().id, v1.id);

        templates.set_active(v2.id).await.unwrap();
        assert_eq!(templates.get_active().await.unwrap().id, v2.id);
        assert!(!templates.get(v1.id).await.unwrap().is_active);

        let active: Vec<_> = templates
            .list()
            .await
            .unwrap()
            .into_iter()
            .filter(|t| t.is_active)
            .collect();
        assert_eq!(active.len(), 1);
    }

    #[tokio::test]
    async fn test_set_active_twice_is_noop() {
        let (templates, _) = store();
        let v1 = templates.create_template(create("v1", true)).await.unwrap();
        let again = templates.set_active(v1.id).await.unwrap();
        assert!(again.is_active);
        assert_eq!(again.updated_at, v1.updated_at);
    }

    #[tokio::test]
    async fn test_unknown_template_not_found() {
        let (templates, _) = store();
        let missing = TemplateId::new();
        assert!(templates.set_active(missing).await.unwrap_err().is(ErrorKind::NotFound));
        assert!(templates.delete(missing).await.unwrap_err().is(ErrorKind::NotFound));
        assert!(templates.get(missing).await.unwrap_err().is(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_blank_fields_rejected() {
        let (templates, _) = store();
        let mut req = create("v1", true);
        req.title = "   ".into();
        let err = templates.create_template(req).await.unwrap_err();
        assert!(err.is(ErrorKind::Validation));
        assert!(templates.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_unreferenced() {
        let (templates, _) = store();
        let v1 = templates.create_template(create("v1", false)).await.unwrap();
        templates.delete(v1.id).await.unwrap();
        assert!(templates.list().await.unwrap().is_empty());
    }
}
