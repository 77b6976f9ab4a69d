use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::StoreError;

/// A video file (movie or episode) known to the library scanner.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaItem {
    #[serde(default)]
    pub id: String,
    /// Path inside the library tree; the natural key for deletes.
    pub path: String,
    pub title: String,
    #[serde(default)]
    pub season: i32,
    #[serde(default)]
    pub episode: i32,
    #[serde(default)]
    pub release_group: String,
    #[serde(default)]
    pub alt_titles: Vec<String>,
    /// Display fields the user pinned by hand; future metadata syncs must
    /// leave these untouched.
    #[serde(default)]
    pub field_locks: Option<serde_json::Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl MediaItem {
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.path.is_empty() {
            return Err(StoreError::Validation("media path is required".into()));
        }
        Ok(())
    }

    #[must_use]
    pub fn created_at_or_now(&self) -> DateTime<Utc> {
        self.created_at.unwrap_or_else(Utc::now)
    }
}
