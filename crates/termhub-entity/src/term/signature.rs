//! How a term was signed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Signature method recorded on a term.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "signature_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SignatureType {
    /// Click-through acceptance in the web UI.
    #[default]
    Electronic,
    /// Certificate-backed digital signature.
    Digital,
}

impl SignatureType {
    /// Return the signature type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Electronic => "electronic",
            Self::Digital => "digital",
        }
    }
}

impl fmt::Display for SignatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SignatureType {
    type Err = termhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "electronic" => Ok(Self::Electronic),
            "digital" => Ok(Self::Digital),
            _ => Err(termhub_core::AppError::validation(format!(
                "Invalid signature type: '{s}'. Expected one of: electronic, digital"
            ))),
        }
    }
}
