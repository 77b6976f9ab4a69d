//! Key-value backend: a single `redb` table holding JSON records under
//! prefixed keys.
//!
//! Keys are `subtitle:<uuid>`, `download:<uuid>`, `media:<uuid>`,
//! `profile:<uuid>`, `mediaprofile:<media_id>`, and `monitor:<uuid>`. Every
//! list walks the whole keyspace, filters by prefix, and orders in memory;
//! there are no secondary indexes. Each call commits one durable write
//! transaction.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use redb::{Database, ReadableTable, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::models::{
    DownloadRecord, LanguageProfile, MediaItem, MonitorStatus, MonitoredItem, SubtitleRecord, Tag,
    TagAssignment,
};
use crate::storage::{StoreError, StoreResult, SubtitleStore};

const RECORDS: TableDefinition<&str, &[u8]> = TableDefinition::new("records");

const SUBTITLE_PREFIX: &str = "subtitle:";
const DOWNLOAD_PREFIX: &str = "download:";
const MEDIA_PREFIX: &str = "media:";
const PROFILE_PREFIX: &str = "profile:";
const MEDIA_PROFILE_PREFIX: &str = "mediaprofile:";
const MONITOR_PREFIX: &str = "monitor:";

#[derive(serde::Serialize, serde::Deserialize)]
struct MediaProfileBinding {
    media_id: String,
    profile_id: String,
}

pub struct KvStore {
    db: Database,
}

impl KvStore {
    /// Opens (creating if necessary) the database file at `location` and
    /// ensures the record table exists.
    pub fn open(location: &str) -> StoreResult<Self> {
        if let Some(parent) = Path::new(location).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Driver(format!("create {}: {e}", parent.display())))?;
        }
        let db = Database::create(location)?;
        Self::ensure_table(db)
    }

    /// A throwaway store with no backing file.
    pub fn in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::ensure_table(db)
    }

    fn ensure_table(db: Database) -> StoreResult<Self> {
        let txn = db.begin_write()?;
        txn.open_table(RECORDS)?;
        txn.commit()?;
        Ok(Self { db })
    }

    fn put_json<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        let bytes = serde_json::to_vec(value)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(RECORDS)?;
            table.insert(key, bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(RECORDS)?;
        match table.get(key)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    fn delete_key(&self, key: &str) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(RECORDS)?;
            table.remove(key)?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Walks the entire keyspace and decodes every record under `prefix`.
    fn scan_prefix<T: DeserializeOwned>(&self, prefix: &str) -> StoreResult<Vec<(String, T)>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(RECORDS)?;
        let mut out = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            let key = key.value();
            if key.starts_with(prefix) {
                out.push((key.to_string(), serde_json::from_slice(value.value())?));
            }
        }
        Ok(out)
    }

    /// Deletes every key in `keys` in one transaction.
    fn delete_keys(&self, keys: &[String]) -> StoreResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(RECORDS)?;
            for key in keys {
                table.remove(key.as_str())?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    fn fresh_id(id: &str) -> String {
        if id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            id.to_string()
        }
    }

    fn profiles(&self) -> StoreResult<Vec<LanguageProfile>> {
        let mut profiles: Vec<LanguageProfile> = self
            .scan_prefix(PROFILE_PREFIX)?
            .into_iter()
            .map(|(_, p)| p)
            .collect();
        profiles.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(profiles)
    }

    /// Rewrites every profile carrying the default flag except `keep_id`,
    /// inside the caller's transaction scope. Used before flagging a new
    /// default.
    fn clear_default_except(
        table: &mut redb::Table<'_, &str, &[u8]>,
        keep_id: &str,
    ) -> StoreResult<()> {
        let mut rewrites = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            let key = key.value();
            if !key.starts_with(PROFILE_PREFIX) {
                continue;
            }
            let mut profile: LanguageProfile = serde_json::from_slice(value.value())?;
            if profile.is_default && profile.id != keep_id {
                profile.is_default = false;
                profile.updated_at = Some(Utc::now());
                rewrites.push((key.to_string(), serde_json::to_vec(&profile)?));
            }
        }
        for (key, bytes) in rewrites {
            table.insert(key.as_str(), bytes.as_slice())?;
        }
        Ok(())
    }
}

#[async_trait]
impl SubtitleStore for KvStore {
    async fn insert_subtitle(&self, rec: SubtitleRecord) -> StoreResult<SubtitleRecord> {
        rec.validate()?;
        let mut rec = rec;
        rec.id = Self::fresh_id(&rec.id);
        rec.created_at = Some(rec.created_at_or_now());
        self.put_json(&format!("{SUBTITLE_PREFIX}{}", rec.id), &rec)?;
        Ok(rec)
    }

    async fn list_subtitles(&self) -> StoreResult<Vec<SubtitleRecord>> {
        let mut recs: Vec<SubtitleRecord> = self
            .scan_prefix(SUBTITLE_PREFIX)?
            .into_iter()
            .map(|(_, r)| r)
            .collect();
        recs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(recs)
    }

    async fn list_subtitles_for_video(
        &self,
        video_file: &str,
    ) -> StoreResult<Vec<SubtitleRecord>> {
        let mut recs = self.list_subtitles().await?;
        recs.retain(|r| r.video_file == video_file);
        Ok(recs)
    }

    async fn list_subtitles_by_parent(&self, parent_id: &str) -> StoreResult<Vec<SubtitleRecord>> {
        let entries: Vec<(String, SubtitleRecord)> = self.scan_prefix(SUBTITLE_PREFIX)?;
        let mut recs: Vec<SubtitleRecord> = entries
            .into_iter()
            .map(|(_, r)| r)
            .filter(|r| r.parent_id.as_deref() == Some(parent_id))
            .collect();
        recs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(recs)
    }

    async fn count_subtitles(&self) -> StoreResult<u64> {
        let recs: Vec<(String, SubtitleRecord)> = self.scan_prefix(SUBTITLE_PREFIX)?;
        Ok(recs.len() as u64)
    }

    async fn delete_subtitles_for_file(&self, file: &str) -> StoreResult<()> {
        let entries: Vec<(String, SubtitleRecord)> = self.scan_prefix(SUBTITLE_PREFIX)?;
        let keys: Vec<String> = entries
            .into_iter()
            .filter(|(_, r)| r.file == file)
            .map(|(k, _)| k)
            .collect();
        self.delete_keys(&keys)
    }

    async fn insert_download(&self, rec: DownloadRecord) -> StoreResult<DownloadRecord> {
        rec.validate()?;
        let mut rec = rec;
        rec.id = Self::fresh_id(&rec.id);
        rec.download_attempts = rec.attempts_or_one();
        rec.created_at = Some(rec.created_at_or_now());
        self.put_json(&format!("{DOWNLOAD_PREFIX}{}", rec.id), &rec)?;
        Ok(rec)
    }

    async fn list_downloads(&self) -> StoreResult<Vec<DownloadRecord>> {
        let mut recs: Vec<DownloadRecord> = self
            .scan_prefix(DOWNLOAD_PREFIX)?
            .into_iter()
            .map(|(_, r)| r)
            .collect();
        recs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(recs)
    }

    async fn list_downloads_for_video(
        &self,
        video_file: &str,
    ) -> StoreResult<Vec<DownloadRecord>> {
        let mut recs = self.list_downloads().await?;
        recs.retain(|r| r.video_file == video_file);
        Ok(recs)
    }

    async fn count_downloads(&self) -> StoreResult<u64> {
        let recs: Vec<(String, DownloadRecord)> = self.scan_prefix(DOWNLOAD_PREFIX)?;
        Ok(recs.len() as u64)
    }

    async fn delete_downloads_for_file(&self, file: &str) -> StoreResult<()> {
        let entries: Vec<(String, DownloadRecord)> = self.scan_prefix(DOWNLOAD_PREFIX)?;
        let keys: Vec<String> = entries
            .into_iter()
            .filter(|(_, r)| r.file == file)
            .map(|(k, _)| k)
            .collect();
        self.delete_keys(&keys)
    }

    async fn insert_media_item(&self, item: MediaItem) -> StoreResult<MediaItem> {
        item.validate()?;
        let mut item = item;
        item.id = Self::fresh_id(&item.id);
        item.created_at = Some(item.created_at_or_now());
        self.put_json(&format!("{MEDIA_PREFIX}{}", item.id), &item)?;
        Ok(item)
    }

    async fn list_media_items(&self) -> StoreResult<Vec<MediaItem>> {
        let mut items: Vec<MediaItem> = self
            .scan_prefix(MEDIA_PREFIX)?
            .into_iter()
            .map(|(_, i)| i)
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn get_media_item(&self, path: &str) -> StoreResult<MediaItem> {
        self.list_media_items()
            .await?
            .into_iter()
            .find(|i| i.path == path)
            .ok_or_else(|| StoreError::not_found("media item", path))
    }

    async fn count_media_items(&self) -> StoreResult<u64> {
        let items: Vec<(String, MediaItem)> = self.scan_prefix(MEDIA_PREFIX)?;
        Ok(items.len() as u64)
    }

    async fn delete_media_item(&self, path: &str) -> StoreResult<()> {
        let entries: Vec<(String, MediaItem)> = self.scan_prefix(MEDIA_PREFIX)?;
        let keys: Vec<String> = entries
            .into_iter()
            .filter(|(_, i)| i.path == path)
            .map(|(k, _)| k)
            .collect();
        self.delete_keys(&keys)
    }

    // Tags are not persisted by this engine. Mutations are accepted and
    // dropped, reads come back empty; callers that need the tag graph use
    // the relational engine.

    async fn create_tag(
        &self,
        name: &str,
        tag_type: &str,
        entity_type: &str,
        color: &str,
        description: &str,
    ) -> StoreResult<Tag> {
        if name.is_empty() {
            return Err(StoreError::Validation("tag name is required".into()));
        }
        Ok(Tag {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            tag_type: if tag_type.is_empty() {
                "user".to_string()
            } else {
                tag_type.to_string()
            },
            entity_type: if entity_type.is_empty() {
                "all".to_string()
            } else {
                entity_type.to_string()
            },
            color: color.to_string(),
            description: description.to_string(),
            created_at: Some(Utc::now()),
        })
    }

    async fn list_tags(&self) -> StoreResult<Vec<Tag>> {
        Ok(Vec::new())
    }

    async fn delete_tag(&self, _tag_id: &str) -> StoreResult<()> {
        Ok(())
    }

    async fn tag_entity(
        &self,
        _tag_id: &str,
        _entity_type: &str,
        _entity_id: &str,
    ) -> StoreResult<()> {
        Ok(())
    }

    async fn untag_entity(
        &self,
        _tag_id: &str,
        _entity_type: &str,
        _entity_id: &str,
    ) -> StoreResult<()> {
        Ok(())
    }

    async fn tag_entities_bulk(&self, _assignments: &[TagAssignment]) -> StoreResult<()> {
        Ok(())
    }

    async fn list_tags_for_entity(
        &self,
        _entity_type: &str,
        _entity_id: &str,
    ) -> StoreResult<Vec<Tag>> {
        Ok(Vec::new())
    }

    async fn filter_by_tags(
        &self,
        _entity_type: &str,
        _tag_names: &[String],
    ) -> StoreResult<Vec<String>> {
        Ok(Vec::new())
    }

    async fn create_language_profile(
        &self,
        profile: LanguageProfile,
    ) -> StoreResult<LanguageProfile> {
        profile.validate()?;
        let mut profile = profile;
        profile.id = Self::fresh_id(&profile.id);
        profile.created_at = Some(profile.created_at_or_now());
        profile.updated_at = Some(Utc::now());

        let bytes = serde_json::to_vec(&profile)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(RECORDS)?;
            if profile.is_default {
                Self::clear_default_except(&mut table, &profile.id)?;
            }
            table.insert(format!("{PROFILE_PREFIX}{}", profile.id).as_str(), bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(profile)
    }

    async fn update_language_profile(&self, profile: LanguageProfile) -> StoreResult<()> {
        profile.validate()?;
        let key = format!("{PROFILE_PREFIX}{}", profile.id);
        let existing: Option<LanguageProfile> = self.get_json(&key)?;
        let existing =
            existing.ok_or_else(|| StoreError::not_found("language profile", &profile.id))?;

        let mut profile = profile;
        profile.created_at = existing.created_at;
        profile.updated_at = Some(Utc::now());

        let bytes = serde_json::to_vec(&profile)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(RECORDS)?;
            if profile.is_default {
                Self::clear_default_except(&mut table, &profile.id)?;
            }
            table.insert(key.as_str(), bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    async fn list_language_profiles(&self) -> StoreResult<Vec<LanguageProfile>> {
        self.profiles()
    }

    async fn get_language_profile(&self, id: &str) -> StoreResult<LanguageProfile> {
        self.get_json(&format!("{PROFILE_PREFIX}{id}"))?
            .ok_or_else(|| StoreError::not_found("language profile", id))
    }

    async fn get_default_language_profile(&self) -> StoreResult<LanguageProfile> {
        let profiles = self.profiles()?;
        if let Some(flagged) = profiles.iter().find(|p| p.is_default) {
            return Ok(flagged.clone());
        }
        profiles
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found("language profile", "default"))
    }

    async fn set_default_language_profile(&self, id: &str) -> StoreResult<()> {
        let key = format!("{PROFILE_PREFIX}{id}");
        let profile: Option<LanguageProfile> = self.get_json(&key)?;
        let mut profile = profile.ok_or_else(|| StoreError::not_found("language profile", id))?;
        profile.is_default = true;
        profile.updated_at = Some(Utc::now());

        let bytes = serde_json::to_vec(&profile)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(RECORDS)?;
            Self::clear_default_except(&mut table, id)?;
            table.insert(key.as_str(), bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    async fn delete_language_profile(&self, id: &str) -> StoreResult<()> {
        let bindings: Vec<(String, MediaProfileBinding)> =
            self.scan_prefix(MEDIA_PROFILE_PREFIX)?;
        let mut keys: Vec<String> = bindings
            .into_iter()
            .filter(|(_, b)| b.profile_id == id)
            .map(|(k, _)| k)
            .collect();
        keys.push(format!("{PROFILE_PREFIX}{id}"));
        self.delete_keys(&keys)
    }

    async fn assign_profile_to_media(&self, media_id: &str, profile_id: &str) -> StoreResult<()> {
        self.get_language_profile(profile_id).await?;
        let binding = MediaProfileBinding {
            media_id: media_id.to_string(),
            profile_id: profile_id.to_string(),
        };
        self.put_json(&format!("{MEDIA_PROFILE_PREFIX}{media_id}"), &binding)
    }

    async fn get_media_profile(&self, media_id: &str) -> StoreResult<LanguageProfile> {
        let binding: Option<MediaProfileBinding> =
            self.get_json(&format!("{MEDIA_PROFILE_PREFIX}{media_id}"))?;
        match binding {
            Some(b) => self.get_language_profile(&b.profile_id).await,
            None => self.get_default_language_profile().await,
        }
    }

    async fn remove_media_profile(&self, media_id: &str) -> StoreResult<()> {
        self.delete_key(&format!("{MEDIA_PROFILE_PREFIX}{media_id}"))
    }

    async fn insert_monitored_item(&self, item: MonitoredItem) -> StoreResult<MonitoredItem> {
        item.validate()?;
        let mut item = item;
        item.id = Self::fresh_id(&item.id);
        item.created_at = Some(item.created_at_or_now());
        item.updated_at = Some(Utc::now());
        self.put_json(&format!("{MONITOR_PREFIX}{}", item.id), &item)?;
        Ok(item)
    }

    async fn list_monitored_items(&self) -> StoreResult<Vec<MonitoredItem>> {
        let mut items: Vec<MonitoredItem> = self
            .scan_prefix(MONITOR_PREFIX)?
            .into_iter()
            .map(|(_, i)| i)
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn update_monitored_item(&self, item: MonitoredItem) -> StoreResult<()> {
        let key = format!("{MONITOR_PREFIX}{}", item.id);
        let existing: Option<MonitoredItem> = self.get_json(&key)?;
        let existing = existing.ok_or_else(|| StoreError::not_found("monitored item", &item.id))?;

        item.validate()?;
        let mut item = item;
        item.created_at = existing.created_at;
        item.updated_at = Some(Utc::now());
        self.put_json(&key, &item)
    }

    async fn delete_monitored_item(&self, id: &str) -> StoreResult<()> {
        self.delete_key(&format!("{MONITOR_PREFIX}{id}"))
    }

    async fn get_monitored_items_to_check(
        &self,
        interval: chrono::Duration,
    ) -> StoreResult<Vec<MonitoredItem>> {
        let cutoff = Utc::now() - interval;
        let entries: Vec<(String, MonitoredItem)> = self.scan_prefix(MONITOR_PREFIX)?;
        let mut items: Vec<MonitoredItem> = entries
            .into_iter()
            .map(|(_, i)| i)
            .filter(|i| {
                matches!(i.status, MonitorStatus::Pending | MonitorStatus::Monitoring)
                    && i.last_checked.is_none_or(|t| t < cutoff)
            })
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(items)
    }

    async fn reset_monitored_item(&self, id: &str) -> StoreResult<()> {
        let key = format!("{MONITOR_PREFIX}{id}");
        let item: Option<MonitoredItem> = self.get_json(&key)?;
        let mut item = item.ok_or_else(|| StoreError::not_found("monitored item", id))?;
        item.reset();
        item.updated_at = Some(Utc::now());
        self.put_json(&key, &item)
    }

    async fn close(&self) -> StoreResult<()> {
        // Dropping the store flushes and closes the database file.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subtitle_ids_are_assigned_on_insert() {
        let store = KvStore::in_memory().unwrap();
        let rec = SubtitleRecord {
            file: "a.srt".into(),
            video_file: "a.mkv".into(),
            language: "en".into(),
            ..Default::default()
        };
        let saved = store.insert_subtitle(rec).await.unwrap();
        assert!(!saved.id.is_empty());
        assert!(saved.created_at.is_some());
    }

    #[tokio::test]
    async fn tag_reads_are_empty_and_mutations_accepted() {
        let store = KvStore::in_memory().unwrap();
        store.tag_entity("1", "subtitle", "x").await.unwrap();
        assert!(store.list_tags().await.unwrap().is_empty());
        assert!(
            store
                .list_tags_for_entity("subtitle", "x")
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn default_profile_flag_moves_between_profiles() {
        let store = KvStore::in_memory().unwrap();
        let a = store
            .create_language_profile(LanguageProfile::seed_default())
            .await
            .unwrap();
        let mut b = LanguageProfile::seed_default();
        b.name = "Secondary".into();
        b.is_default = false;
        let b = store.create_language_profile(b).await.unwrap();

        store.set_default_language_profile(&b.id).await.unwrap();

        let profiles = store.list_language_profiles().await.unwrap();
        let defaults: Vec<_> = profiles.iter().filter(|p| p.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id, b.id);
        assert_ne!(defaults[0].id, a.id);
    }
}
