//! Form metadata types

use serde::{Deserialize, Serialize};

/// `{id, title}` row from the form catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSummary {
    pub id: i64,
    pub title: String,
}

/// Result of the ad-hoc validity check on an uploaded XLSForm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormValidity {
    /// Geodata attachments the form expects, by category name
    #[serde(rename = "required media")]
    pub required_media: Vec<String>,

    pub message: String,
}

impl FormValidity {
    pub fn valid(required_media: Vec<String>) -> Self {
        Self {
            required_media,
            message: "Your form is valid".to_string(),
        }
    }
}
