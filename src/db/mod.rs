//! Relational backend: SQLite through `sea-orm`, one repository per record
//! family, schema managed by [`migrator::Migrator`].

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

use crate::models::{
    DownloadRecord, LanguageProfile, MediaItem, MonitoredItem, SubtitleRecord, Tag, TagAssignment,
};
use crate::storage::{StoreError, StoreResult, SubtitleStore};

pub mod migrator;
pub mod repositories;

use repositories::{
    DownloadRepository, MediaRepository, MonitoredRepository, ProfileRepository,
    SubtitleRepository, TagRepository,
};

pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

pub(crate) fn parse_ts(raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Serialization(format!("bad timestamp {raw:?}: {e}")))
}

#[derive(Clone)]
pub struct SqlStore {
    conn: DatabaseConnection,
}

impl SqlStore {
    /// Opens (creating if necessary) the database at `location` and brings
    /// the schema up to date. `location` may be a bare path, a `sqlite:` URL,
    /// or `:memory:`.
    pub async fn new(location: &str) -> StoreResult<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = location.contains(":memory:");
        let db_url = if in_memory {
            "sqlite::memory:".to_string()
        } else {
            let path_str = location.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)
                    .map_err(|e| StoreError::Driver(format!("create {path_str}: {e}")))?;
            }
            format!("sqlite:{path_str}")
        };

        // An in-memory database exists per connection; more than one pooled
        // connection would see different schemas.
        let max_connections = if in_memory { 1 } else { 5 };

        let mut opt = ConnectOptions::new(db_url);
        opt.max_connections(max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        migrator::Migrator::up(&conn, None).await?;

        info!("database connected and migrations applied");
        Ok(Self { conn })
    }

    fn subtitle_repo(&self) -> SubtitleRepository {
        SubtitleRepository::new(self.conn.clone())
    }

    fn download_repo(&self) -> DownloadRepository {
        DownloadRepository::new(self.conn.clone())
    }

    fn media_repo(&self) -> MediaRepository {
        MediaRepository::new(self.conn.clone())
    }

    fn tag_repo(&self) -> TagRepository {
        TagRepository::new(self.conn.clone())
    }

    fn profile_repo(&self) -> ProfileRepository {
        ProfileRepository::new(self.conn.clone())
    }

    fn monitored_repo(&self) -> MonitoredRepository {
        MonitoredRepository::new(self.conn.clone())
    }
}

#[async_trait]
impl SubtitleStore for SqlStore {
    async fn insert_subtitle(&self, rec: SubtitleRecord) -> StoreResult<SubtitleRecord> {
        self.subtitle_repo().insert(rec).await
    }

    async fn list_subtitles(&self) -> StoreResult<Vec<SubtitleRecord>> {
        self.subtitle_repo().list_all().await
    }

    async fn list_subtitles_for_video(
        &self,
        video_file: &str,
    ) -> StoreResult<Vec<SubtitleRecord>> {
        self.subtitle_repo().list_for_video(video_file).await
    }

    async fn list_subtitles_by_parent(&self, parent_id: &str) -> StoreResult<Vec<SubtitleRecord>> {
        self.subtitle_repo().list_by_parent(parent_id).await
    }

    async fn count_subtitles(&self) -> StoreResult<u64> {
        self.subtitle_repo().count().await
    }

    async fn delete_subtitles_for_file(&self, file: &str) -> StoreResult<()> {
        self.subtitle_repo().delete_for_file(file).await
    }

    async fn insert_download(&self, rec: DownloadRecord) -> StoreResult<DownloadRecord> {
        self.download_repo().insert(rec).await
    }

    async fn list_downloads(&self) -> StoreResult<Vec<DownloadRecord>> {
        self.download_repo().list_all().await
    }

    async fn list_downloads_for_video(
        &self,
        video_file: &str,
    ) -> StoreResult<Vec<DownloadRecord>> {
        self.download_repo().list_for_video(video_file).await
    }

    async fn count_downloads(&self) -> StoreResult<u64> {
        self.download_repo().count().await
    }

    async fn delete_downloads_for_file(&self, file: &str) -> StoreResult<()> {
        self.download_repo().delete_for_file(file).await
    }

    async fn insert_media_item(&self, item: MediaItem) -> StoreResult<MediaItem> {
        self.media_repo().insert(item).await
    }

    async fn list_media_items(&self) -> StoreResult<Vec<MediaItem>> {
        self.media_repo().list_all().await
    }

    async fn get_media_item(&self, path: &str) -> StoreResult<MediaItem> {
        self.media_repo().get_by_path(path).await
    }

    async fn count_media_items(&self) -> StoreResult<u64> {
        self.media_repo().count().await
    }

    async fn delete_media_item(&self, path: &str) -> StoreResult<()> {
        self.media_repo().delete_by_path(path).await
    }

    async fn create_tag(
        &self,
        name: &str,
        tag_type: &str,
        entity_type: &str,
        color: &str,
        description: &str,
    ) -> StoreResult<Tag> {
        self.tag_repo()
            .create(name, tag_type, entity_type, color, description)
            .await
    }

    async fn list_tags(&self) -> StoreResult<Vec<Tag>> {
        self.tag_repo().list_all().await
    }

    async fn delete_tag(&self, tag_id: &str) -> StoreResult<()> {
        self.tag_repo().delete(tag_id).await
    }

    async fn tag_entity(
        &self,
        tag_id: &str,
        entity_type: &str,
        entity_id: &str,
    ) -> StoreResult<()> {
        self.tag_repo().assign(tag_id, entity_type, entity_id).await
    }

    async fn untag_entity(
        &self,
        tag_id: &str,
        entity_type: &str,
        entity_id: &str,
    ) -> StoreResult<()> {
        self.tag_repo()
            .unassign(tag_id, entity_type, entity_id)
            .await
    }

    async fn tag_entities_bulk(&self, assignments: &[TagAssignment]) -> StoreResult<()> {
        self.tag_repo().assign_bulk(assignments).await
    }

    async fn list_tags_for_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> StoreResult<Vec<Tag>> {
        self.tag_repo().tags_for_entity(entity_type, entity_id).await
    }

    async fn filter_by_tags(
        &self,
        entity_type: &str,
        tag_names: &[String],
    ) -> StoreResult<Vec<String>> {
        self.tag_repo().filter_by_tags(entity_type, tag_names).await
    }

    async fn create_language_profile(
        &self,
        profile: LanguageProfile,
    ) -> StoreResult<LanguageProfile> {
        self.profile_repo().create(profile).await
    }

    async fn update_language_profile(&self, profile: LanguageProfile) -> StoreResult<()> {
        self.profile_repo().update(&profile).await?;
        Ok(())
    }

    async fn list_language_profiles(&self) -> StoreResult<Vec<LanguageProfile>> {
        self.profile_repo().list_all().await
    }

    async fn get_language_profile(&self, id: &str) -> StoreResult<LanguageProfile> {
        self.profile_repo().get(id).await
    }

    async fn get_default_language_profile(&self) -> StoreResult<LanguageProfile> {
        self.profile_repo().get_default().await
    }

    async fn set_default_language_profile(&self, id: &str) -> StoreResult<()> {
        self.profile_repo().set_default(id).await
    }

    async fn delete_language_profile(&self, id: &str) -> StoreResult<()> {
        self.profile_repo().delete(id).await
    }

    async fn assign_profile_to_media(&self, media_id: &str, profile_id: &str) -> StoreResult<()> {
        self.profile_repo().assign_media(media_id, profile_id).await
    }

    async fn get_media_profile(&self, media_id: &str) -> StoreResult<LanguageProfile> {
        self.profile_repo().media_profile(media_id).await
    }

    async fn remove_media_profile(&self, media_id: &str) -> StoreResult<()> {
        self.profile_repo().remove_media(media_id).await
    }

    async fn insert_monitored_item(&self, item: MonitoredItem) -> StoreResult<MonitoredItem> {
        self.monitored_repo().insert(item).await
    }

    async fn list_monitored_items(&self) -> StoreResult<Vec<MonitoredItem>> {
        self.monitored_repo().list_all().await
    }

    async fn update_monitored_item(&self, item: MonitoredItem) -> StoreResult<()> {
        self.monitored_repo().update(&item).await?;
        Ok(())
    }

    async fn delete_monitored_item(&self, id: &str) -> StoreResult<()> {
        self.monitored_repo().delete(id).await
    }

    async fn get_monitored_items_to_check(
        &self,
        interval: chrono::Duration,
    ) -> StoreResult<Vec<MonitoredItem>> {
        let cutoff = Utc::now() - interval;
        self.monitored_repo().due_for_check(cutoff).await
    }

    async fn reset_monitored_item(&self, id: &str) -> StoreResult<()> {
        self.monitored_repo().reset(id).await?;
        Ok(())
    }

    async fn close(&self) -> StoreResult<()> {
        // The pool is reference-counted; dropping the last clone closes it.
        Ok(())
    }
}
