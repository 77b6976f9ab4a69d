//! The storage contract every backend implements and every caller holds.
//!
//! Two engines satisfy [`SubtitleStore`]: the relational engine in
//! [`crate::db`] (SQLite via `sea-orm`, indexed lookups, native ordering) and
//! the key-value engine in [`crate::kv`] (`redb`, prefix-scanned keyspace,
//! in-memory ordering). Both return records newest-first from every `list`
//! call that takes no order parameter, so callers never branch on the
//! backend.

pub mod error;
pub mod migrate;
pub mod wire;

use std::sync::Arc;

use async_trait::async_trait;

use crate::models::{
    DownloadRecord, LanguageProfile, MediaItem, MonitoredItem, SubtitleRecord, Tag, TagAssignment,
};

pub use error::StoreError;

pub type StoreResult<T> = Result<T, StoreError>;

/// Data-access contract over subtitles, downloads, media items, tags,
/// language profiles, and monitored items.
///
/// Inserts return the persisted record with store-assigned fields (`id`,
/// `created_at`) filled in. Deletes by natural key remove every matching
/// record, not a single row.
#[async_trait]
pub trait SubtitleStore: Send + Sync {
    // Subtitles

    async fn insert_subtitle(&self, rec: SubtitleRecord) -> StoreResult<SubtitleRecord>;

    /// All subtitles, newest-first.
    async fn list_subtitles(&self) -> StoreResult<Vec<SubtitleRecord>>;

    /// Subtitles attached to one video file, newest-first.
    async fn list_subtitles_for_video(&self, video_file: &str)
    -> StoreResult<Vec<SubtitleRecord>>;

    /// Direct children of a subtitle in its modification chain, oldest-first
    /// so history replays in creation order.
    async fn list_subtitles_by_parent(&self, parent_id: &str) -> StoreResult<Vec<SubtitleRecord>>;

    async fn count_subtitles(&self) -> StoreResult<u64>;

    /// Removes every subtitle stored under `file`.
    async fn delete_subtitles_for_file(&self, file: &str) -> StoreResult<()>;

    // Downloads (append-only audit log)

    async fn insert_download(&self, rec: DownloadRecord) -> StoreResult<DownloadRecord>;

    async fn list_downloads(&self) -> StoreResult<Vec<DownloadRecord>>;

    async fn list_downloads_for_video(&self, video_file: &str)
    -> StoreResult<Vec<DownloadRecord>>;

    async fn count_downloads(&self) -> StoreResult<u64>;

    async fn delete_downloads_for_file(&self, file: &str) -> StoreResult<()>;

    // Media items

    async fn insert_media_item(&self, item: MediaItem) -> StoreResult<MediaItem>;

    async fn list_media_items(&self) -> StoreResult<Vec<MediaItem>>;

    async fn get_media_item(&self, path: &str) -> StoreResult<MediaItem>;

    async fn count_media_items(&self) -> StoreResult<u64>;

    async fn delete_media_item(&self, path: &str) -> StoreResult<()>;

    // Tags

    /// Creates a tag, defaulting `tag_type` to "user" and `entity_type` to
    /// "all" when empty, and returns the persisted row.
    async fn create_tag(
        &self,
        name: &str,
        tag_type: &str,
        entity_type: &str,
        color: &str,
        description: &str,
    ) -> StoreResult<Tag>;

    async fn list_tags(&self) -> StoreResult<Vec<Tag>>;

    /// Deletes a tag and every association that references it.
    async fn delete_tag(&self, tag_id: &str) -> StoreResult<()>;

    async fn tag_entity(&self, tag_id: &str, entity_type: &str, entity_id: &str)
    -> StoreResult<()>;

    async fn untag_entity(
        &self,
        tag_id: &str,
        entity_type: &str,
        entity_id: &str,
    ) -> StoreResult<()>;

    /// Applies many assignments in one transaction; either all land or none
    /// do.
    async fn tag_entities_bulk(&self, assignments: &[TagAssignment]) -> StoreResult<()>;

    async fn list_tags_for_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> StoreResult<Vec<Tag>>;

    /// Entity IDs carrying *every* named tag (AND semantics). Zero tag names
    /// yields an empty result, not "all entities".
    async fn filter_by_tags(
        &self,
        entity_type: &str,
        tag_names: &[String],
    ) -> StoreResult<Vec<String>>;

    // Language profiles

    async fn create_language_profile(
        &self,
        profile: LanguageProfile,
    ) -> StoreResult<LanguageProfile>;

    async fn update_language_profile(&self, profile: LanguageProfile) -> StoreResult<()>;

    async fn list_language_profiles(&self) -> StoreResult<Vec<LanguageProfile>>;

    async fn get_language_profile(&self, id: &str) -> StoreResult<LanguageProfile>;

    /// The profile flagged default, falling back to the oldest profile when
    /// the flag is missing. `NotFound` only when no profile exists at all.
    async fn get_default_language_profile(&self) -> StoreResult<LanguageProfile>;

    /// Flags one profile default and clears the flag everywhere else in the
    /// same step.
    async fn set_default_language_profile(&self, id: &str) -> StoreResult<()>;

    async fn delete_language_profile(&self, id: &str) -> StoreResult<()>;

    /// Binds a media item to a profile, replacing any previous binding.
    async fn assign_profile_to_media(&self, media_id: &str, profile_id: &str) -> StoreResult<()>;

    /// The explicitly assigned profile, else the current default.
    async fn get_media_profile(&self, media_id: &str) -> StoreResult<LanguageProfile>;

    async fn remove_media_profile(&self, media_id: &str) -> StoreResult<()>;

    // Monitored items

    async fn insert_monitored_item(&self, item: MonitoredItem) -> StoreResult<MonitoredItem>;

    async fn list_monitored_items(&self) -> StoreResult<Vec<MonitoredItem>>;

    async fn update_monitored_item(&self, item: MonitoredItem) -> StoreResult<()>;

    async fn delete_monitored_item(&self, id: &str) -> StoreResult<()>;

    /// Items never checked, or last checked before `now - interval`.
    async fn get_monitored_items_to_check(
        &self,
        interval: chrono::Duration,
    ) -> StoreResult<Vec<MonitoredItem>>;

    /// Manual blacklist release: back to `pending` with a zeroed retry
    /// counter.
    async fn reset_monitored_item(&self, id: &str) -> StoreResult<()>;

    /// Releases backend resources. Safe to call once; a second call returns
    /// `Ok` and must not panic.
    async fn close(&self) -> StoreResult<()>;
}

/// Builds a store from an operator-supplied backend name.
///
/// `"redb"` (or the historical alias `"pebble"`) selects the embedded
/// key-value engine, `"sqlite"` and `"default"` the relational engine.
/// Backends that are not linked into this build come back as a typed
/// [`StoreError::Unsupported`] naming the working alternative, so capability
/// gaps surface at open time instead of leaking into contract semantics.
pub async fn open_store(location: &str, backend: &str) -> StoreResult<Arc<dyn SubtitleStore>> {
    match backend {
        "redb" | "pebble" => {
            let store = crate::kv::KvStore::open(location)?;
            Ok(Arc::new(store))
        }
        "sqlite" | "default" => {
            let store = crate::db::SqlStore::new(location).await?;
            Ok(Arc::new(store))
        }
        other => Err(StoreError::Unsupported {
            requested: other.to_string(),
            alternative: "sqlite",
        }),
    }
}
