use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::StoreError;

/// One fetch attempt against a subtitle provider.
///
/// Download history is append-only: a retry is recorded by inserting a fresh
/// row produced by [`DownloadRecord::retry`], never by mutating the original.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DownloadRecord {
    #[serde(default)]
    pub id: String,
    pub file: String,
    pub video_file: String,
    pub provider: String,
    pub language: String,
    #[serde(default)]
    pub search_query: String,
    #[serde(default)]
    pub match_score: Option<f64>,
    #[serde(default)]
    pub download_attempts: u32,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub response_time_ms: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl DownloadRecord {
    /// Produces the follow-up row for a repeated attempt: same natural keys,
    /// incremented attempt counter, no ID so the store assigns a new one.
    #[must_use]
    pub fn retry(&self) -> Self {
        Self {
            id: String::new(),
            download_attempts: self.download_attempts.max(1) + 1,
            created_at: None,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.file.is_empty() {
            return Err(StoreError::Validation("download file is required".into()));
        }
        if self.provider.is_empty() {
            return Err(StoreError::Validation(
                "download provider is required".into(),
            ));
        }
        if let Some(score) = self.match_score
            && !(0.0..=1.0).contains(&score)
        {
            return Err(StoreError::Validation(format!(
                "match score {score} outside [0, 1]"
            )));
        }
        Ok(())
    }

    /// Attempt counters start at one even when callers leave the field unset.
    #[must_use]
    pub fn attempts_or_one(&self) -> u32 {
        self.download_attempts.max(1)
    }

    #[must_use]
    pub fn created_at_or_now(&self) -> DateTime<Utc> {
        self.created_at.unwrap_or_else(Utc::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> DownloadRecord {
        DownloadRecord {
            id: "41".into(),
            file: "movie.en.srt".into(),
            video_file: "movie.mkv".into(),
            provider: "opensubtitles".into(),
            language: "en".into(),
            download_attempts: 1,
            ..Default::default()
        }
    }

    #[test]
    fn retry_increments_attempts_and_clears_identity() {
        let again = record().retry();
        assert_eq!(again.download_attempts, 2);
        assert!(again.id.is_empty());
        assert!(again.created_at.is_none());
        assert_eq!(again.file, "movie.en.srt");
    }

    #[test]
    fn retry_on_unset_counter_starts_from_one() {
        let mut rec = record();
        rec.download_attempts = 0;
        assert_eq!(rec.retry().download_attempts, 2);
        assert_eq!(rec.attempts_or_one(), 1);
    }

    #[test]
    fn match_score_is_validated() {
        let mut rec = record();
        rec.match_score = Some(2.0);
        assert!(rec.validate().is_err());
    }
}
