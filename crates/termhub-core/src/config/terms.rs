//! Volunteer term lifecycle configuration.

use serde::{Deserialize, Serialize};

/// Validity and reminder windows for signed terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermsConfig {
    /// How long a signed term stays valid, in calendar months.
    #[serde(default = "default_validity_months")]
    pub validity_months: u32,
    /// How many days before expiry the reminder sweep picks a term up.
    #[serde(default = "default_reminder_window_days")]
    pub reminder_window_days: i64,
    /// Link placed on reminder notifications.
    #[serde(default = "default_action_url")]
    pub renewal_url: String,
}

impl Default for TermsConfig {
    fn default() -> Self {
        Self {
            validity_months: default_validity_months(),
            reminder_window_days: default_reminder_window_days(),
            renewal_url: default_action_url(),
        }
    }
}

fn default_validity_months() -> u32 {
    12
}

fn default_reminder_window_days() -> i64 {
    30
}

fn default_action_url() -> String {
    "/volunteer-terms".to_string()
}
