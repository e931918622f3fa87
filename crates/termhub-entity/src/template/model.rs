//! Term template entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use termhub_core::types::id::{TemplateId, UserId};

/// Versioned agreement text that volunteer terms are signed against.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TermTemplate {
    /// Unique template identifier.
    pub id: TemplateId,
    /// Display title.
    pub title: String,
    /// Full agreement text.
    pub content: String,
    /// Free-form version label (e.g. `"2024.1"`).
    pub version: String,
    /// Whether this is the template new terms are signed against.
    pub is_active: bool,
    /// Administrator who created the template.
    pub created_by: Option<UserId>,
    /// When the template was created.
    pub created_at: DateTime<Utc>,
    /// When the template was last modified.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a new template.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTemplate {
    /// Display title.
    #[validate(length(min = 1, max = 255, message = "title must not be empty"))]
    pub title: String,
    /// Agreement text.
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: String,
    /// Version label.
    #[validate(length(min = 1, max = 50, message = "version must not be empty"))]
    pub version: String,
    /// Activate the template immediately, deactivating all others.
    pub make_active: bool,
    /// Creating administrator.
    pub created_by: Option<UserId>,
}

impl CreateTemplate {
    /// Trim surrounding whitespace so blank fields fail validation.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.content = self.content.trim().to_string();
        self.version = self.version.trim().to_string();
        self
    }
}
