use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DownloadRecord, MediaItem, SubtitleRecord};

/// A global label that can be attached to any taggable entity.
///
/// `entity_type` is an advisory scope hint ("all" by default); the
/// association table is what actually binds a tag to entities.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub tag_type: String,
    pub entity_type: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// One edge of the polymorphic tag join, keyed on
/// `(tag_id, entity_type, entity_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagAssignment {
    pub tag_id: String,
    pub entity_type: String,
    pub entity_id: String,
}

impl TagAssignment {
    #[must_use]
    pub fn new(tag_id: &str, entity_type: &str, entity_id: &str) -> Self {
        Self {
            tag_id: tag_id.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
        }
    }

    #[must_use]
    pub fn for_entity<E: HasEntityIdentity>(tag_id: &str, entity: &E) -> Self {
        Self::new(tag_id, E::ENTITY_KIND, &entity.entity_key())
    }
}

/// Capability of being tagged: a stable kind plus a store identifier.
///
/// Keeping this as a trait (rather than ad hoc string pairs at call sites)
/// keeps the association join purely data-driven.
pub trait HasEntityIdentity {
    const ENTITY_KIND: &'static str;

    fn entity_key(&self) -> String;
}

impl HasEntityIdentity for SubtitleRecord {
    const ENTITY_KIND: &'static str = "subtitle";

    fn entity_key(&self) -> String {
        self.id.clone()
    }
}

impl HasEntityIdentity for DownloadRecord {
    const ENTITY_KIND: &'static str = "download";

    fn entity_key(&self) -> String {
        self.id.clone()
    }
}

impl HasEntityIdentity for MediaItem {
    const ENTITY_KIND: &'static str = "media";

    fn entity_key(&self) -> String {
        self.id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_uses_entity_identity() {
        let media = MediaItem {
            id: "7".into(),
            path: "/library/show/s01e01.mkv".into(),
            title: "Show".into(),
            ..Default::default()
        };

        let assignment = TagAssignment::for_entity("3", &media);
        assert_eq!(assignment.entity_type, "media");
        assert_eq!(assignment.entity_id, "7");
        assert_eq!(assignment.tag_id, "3");
    }
}
