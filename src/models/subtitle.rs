use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::StoreError;

/// How a subtitle file came to exist relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModificationType {
    #[default]
    Original,
    Sync,
    Translate,
    ManualEdit,
    AutoCorrect,
    FormatConvert,
}

impl ModificationType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Sync => "sync",
            Self::Translate => "translate",
            Self::ManualEdit => "manual_edit",
            Self::AutoCorrect => "auto_correct",
            Self::FormatConvert => "format_convert",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "sync" => Self::Sync,
            "translate" => Self::Translate,
            "manual_edit" => Self::ManualEdit,
            "auto_correct" => Self::AutoCorrect,
            "format_convert" => Self::FormatConvert,
            _ => Self::Original,
        }
    }
}

impl std::fmt::Display for ModificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A subtitle on disk (or embedded in a container) tracked by the library.
///
/// `parent_id` links a derived subtitle (sync, translation, manual edit) back
/// to the record it was produced from, forming a forest per video file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubtitleRecord {
    /// Opaque store-assigned identifier; empty until inserted.
    #[serde(default)]
    pub id: String,
    pub file: String,
    pub video_file: String,
    #[serde(default)]
    pub release: String,
    pub language: String,
    pub service: String,
    #[serde(default)]
    pub embedded: bool,
    #[serde(default)]
    pub source_url: Option<String>,
    /// Provider-specific payload, stored verbatim.
    #[serde(default)]
    pub provider_metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub confidence_score: Option<f64>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub modification_type: ModificationType,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl SubtitleRecord {
    /// Checks insert-time invariants. Scores outside `[0, 1]` are rejected,
    /// never clamped.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.file.is_empty() {
            return Err(StoreError::Validation("subtitle file is required".into()));
        }
        if self.language.is_empty() {
            return Err(StoreError::Validation(
                "subtitle language is required".into(),
            ));
        }
        if let Some(score) = self.confidence_score
            && !(0.0..=1.0).contains(&score)
        {
            return Err(StoreError::Validation(format!(
                "confidence score {score} outside [0, 1]"
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn created_at_or_now(&self) -> DateTime<Utc> {
        self.created_at.unwrap_or_else(Utc::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modification_type_round_trips_through_strings() {
        for mt in [
            ModificationType::Original,
            ModificationType::Sync,
            ModificationType::Translate,
            ModificationType::ManualEdit,
            ModificationType::AutoCorrect,
            ModificationType::FormatConvert,
        ] {
            assert_eq!(ModificationType::parse(mt.as_str()), mt);
        }
    }

    #[test]
    fn unknown_modification_type_falls_back_to_original() {
        assert_eq!(
            ModificationType::parse("resample"),
            ModificationType::Original
        );
    }

    #[test]
    fn score_bounds_are_inclusive() {
        let mut rec = SubtitleRecord {
            file: "a.srt".into(),
            video_file: "a.mkv".into(),
            language: "en".into(),
            service: "opensubtitles".into(),
            ..Default::default()
        };

        rec.confidence_score = Some(0.0);
        assert!(rec.validate().is_ok());
        rec.confidence_score = Some(1.0);
        assert!(rec.validate().is_ok());
        rec.confidence_score = Some(1.1);
        assert!(rec.validate().is_err());
        rec.confidence_score = Some(-0.01);
        assert!(rec.validate().is_err());
    }
}
