use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::storage::StoreError;

/// One language preference inside a profile. Lower priority wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileLanguage {
    pub language: String,
    pub priority: u32,
    #[serde(default)]
    pub forced: bool,
    #[serde(default)]
    pub hi: bool,
}

/// An ordered list of wanted languages plus the score below which a match is
/// not considered good enough.
///
/// Exactly one profile is the default at any time; media without an explicit
/// assignment falls back to it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LanguageProfile {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub languages: Vec<ProfileLanguage>,
    pub cutoff_score: u32,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl LanguageProfile {
    /// The stock profile seeded into an empty store.
    #[must_use]
    pub fn seed_default() -> Self {
        Self {
            name: "Default".into(),
            languages: vec![ProfileLanguage {
                language: "en".into(),
                priority: 1,
                forced: false,
                hi: false,
            }],
            cutoff_score: 80,
            is_default: true,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.name.is_empty() {
            return Err(StoreError::Validation("profile name is required".into()));
        }
        if self.languages.is_empty() {
            return Err(StoreError::Validation(
                "profile needs at least one language".into(),
            ));
        }
        if self.cutoff_score > 100 {
            return Err(StoreError::Validation(format!(
                "cutoff score {} outside [0, 100]",
                self.cutoff_score
            )));
        }

        let mut seen = HashSet::new();
        for lang in &self.languages {
            if lang.language.is_empty() {
                return Err(StoreError::Validation("empty language code".into()));
            }
            if !seen.insert(lang.priority) {
                return Err(StoreError::Validation(format!(
                    "duplicate priority {} in profile '{}'",
                    lang.priority, self.name
                )));
            }
        }
        Ok(())
    }

    /// Creation time supplied by the caller, else now.
    #[must_use]
    pub fn created_at_or_now(&self) -> DateTime<Utc> {
        self.created_at.unwrap_or_else(Utc::now)
    }

    /// Languages in evaluation order, most preferred first.
    #[must_use]
    pub fn ordered_languages(&self) -> Vec<ProfileLanguage> {
        let mut langs = self.languages.clone();
        langs.sort_by_key(|l| l.priority);
        langs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(languages: Vec<ProfileLanguage>) -> LanguageProfile {
        LanguageProfile {
            name: "Anime".into(),
            languages,
            cutoff_score: 75,
            ..Default::default()
        }
    }

    fn lang(code: &str, priority: u32) -> ProfileLanguage {
        ProfileLanguage {
            language: code.into(),
            priority,
            forced: false,
            hi: false,
        }
    }

    #[test]
    fn ordered_languages_sorts_by_priority() {
        let p = profile(vec![lang("fr", 3), lang("en", 1), lang("ja", 2)]);
        let ordered: Vec<_> = p
            .ordered_languages()
            .into_iter()
            .map(|l| l.language)
            .collect();
        assert_eq!(ordered, ["en", "ja", "fr"]);
    }

    #[test]
    fn duplicate_priorities_are_rejected() {
        let p = profile(vec![lang("en", 1), lang("ja", 1)]);
        assert!(matches!(p.validate(), Err(StoreError::Validation(_))));
    }

    #[test]
    fn cutoff_over_100_is_rejected() {
        let mut p = profile(vec![lang("en", 1)]);
        p.cutoff_score = 101;
        assert!(p.validate().is_err());
        p.cutoff_score = 100;
        assert!(p.validate().is_ok());
    }

    #[test]
    fn empty_language_list_is_rejected() {
        assert!(profile(vec![]).validate().is_err());
    }
}
