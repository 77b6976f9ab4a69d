use std::sync::Arc;

use subarr::db::SqlStore;
use subarr::kv::KvStore;
use subarr::models::{
    DownloadRecord, LanguageProfile, MediaItem, ModificationType, MonitorStatus, MonitoredItem,
    ProfileLanguage, SubtitleRecord, TagAssignment,
};
use subarr::storage::{StoreError, SubtitleStore, migrate::copy_store, open_store};

async fn sql_store() -> Arc<dyn SubtitleStore> {
    Arc::new(SqlStore::new(":memory:").await.expect("open sqlite"))
}

fn kv_store() -> Arc<dyn SubtitleStore> {
    Arc::new(KvStore::in_memory().expect("open redb"))
}

fn subtitle(file: &str, video: &str) -> SubtitleRecord {
    SubtitleRecord {
        file: file.to_string(),
        video_file: video.to_string(),
        release: "GroupA".to_string(),
        language: "en".to_string(),
        service: "opensubtitles".to_string(),
        ..Default::default()
    }
}

fn download(file: &str, video: &str) -> DownloadRecord {
    DownloadRecord {
        file: file.to_string(),
        video_file: video.to_string(),
        provider: "opensubtitles".to_string(),
        language: "en".to_string(),
        ..Default::default()
    }
}

fn media(path: &str) -> MediaItem {
    MediaItem {
        path: path.to_string(),
        title: "Show".to_string(),
        season: 1,
        episode: 3,
        ..Default::default()
    }
}

fn profile(name: &str) -> LanguageProfile {
    LanguageProfile {
        name: name.to_string(),
        languages: vec![ProfileLanguage {
            language: "en".to_string(),
            priority: 1,
            forced: false,
            hi: false,
        }],
        cutoff_score: 80,
        ..Default::default()
    }
}

async fn subtitle_round_trip(store: &dyn SubtitleStore) {
    let mut rec = subtitle("show.s01e03.en.srt", "show.s01e03.mkv");
    rec.source_url = Some("https://example.org/sub/1".to_string());
    rec.provider_metadata = Some(serde_json::json!({"release": "GroupA", "score": 97}));
    rec.confidence_score = Some(0.93);
    rec.modification_type = ModificationType::Sync;

    let saved = store.insert_subtitle(rec.clone()).await.unwrap();
    assert!(!saved.id.is_empty());
    assert!(saved.created_at.is_some());

    let listed = store.list_subtitles().await.unwrap();
    assert_eq!(listed.len(), 1);
    let got = &listed[0];
    assert_eq!(got.file, rec.file);
    assert_eq!(got.source_url, rec.source_url);
    assert_eq!(got.provider_metadata, rec.provider_metadata);
    assert_eq!(got.confidence_score, rec.confidence_score);
    assert_eq!(got.modification_type, ModificationType::Sync);
}

#[tokio::test]
async fn subtitle_round_trip_sql() {
    subtitle_round_trip(sql_store().await.as_ref()).await;
}

#[tokio::test]
async fn subtitle_round_trip_kv() {
    subtitle_round_trip(kv_store().as_ref()).await;
}

async fn listing_is_newest_first(store: &dyn SubtitleStore) {
    for n in 1..=3 {
        let mut rec = subtitle(&format!("sub{n}.srt"), "video.mkv");
        // Distinct timestamps so ordering is observable on both engines.
        rec.created_at = Some(chrono::Utc::now() - chrono::Duration::minutes(10 - n));
        store.insert_subtitle(rec).await.unwrap();
    }

    let listed = store.list_subtitles().await.unwrap();
    let files: Vec<&str> = listed.iter().map(|r| r.file.as_str()).collect();
    assert_eq!(files, vec!["sub3.srt", "sub2.srt", "sub1.srt"]);

    let for_video = store.list_subtitles_for_video("video.mkv").await.unwrap();
    assert_eq!(for_video.len(), 3);
    assert_eq!(for_video[0].file, "sub3.srt");
}

#[tokio::test]
async fn listing_is_newest_first_sql() {
    listing_is_newest_first(sql_store().await.as_ref()).await;
}

#[tokio::test]
async fn listing_is_newest_first_kv() {
    listing_is_newest_first(kv_store().as_ref()).await;
}

async fn natural_key_deletes_are_set_based(store: &dyn SubtitleStore) {
    store
        .insert_subtitle(subtitle("dup.srt", "a.mkv"))
        .await
        .unwrap();
    store
        .insert_subtitle(subtitle("dup.srt", "b.mkv"))
        .await
        .unwrap();
    store
        .insert_subtitle(subtitle("keep.srt", "a.mkv"))
        .await
        .unwrap();

    store.delete_subtitles_for_file("dup.srt").await.unwrap();

    let remaining = store.list_subtitles().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].file, "keep.srt");
}

#[tokio::test]
async fn natural_key_deletes_are_set_based_sql() {
    natural_key_deletes_are_set_based(sql_store().await.as_ref()).await;
}

#[tokio::test]
async fn natural_key_deletes_are_set_based_kv() {
    natural_key_deletes_are_set_based(kv_store().as_ref()).await;
}

async fn scores_outside_unit_interval_are_rejected(store: &dyn SubtitleStore) {
    let mut rec = subtitle("a.srt", "a.mkv");
    rec.confidence_score = Some(1.1);
    let err = store.insert_subtitle(rec).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    let mut rec = subtitle("b.srt", "b.mkv");
    rec.confidence_score = Some(0.0);
    store.insert_subtitle(rec).await.unwrap();

    let mut rec = download("c.srt", "c.mkv");
    rec.match_score = Some(-0.2);
    let err = store.insert_download(rec).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    let mut rec = download("d.srt", "d.mkv");
    rec.match_score = Some(1.0);
    store.insert_download(rec).await.unwrap();
}

#[tokio::test]
async fn scores_outside_unit_interval_are_rejected_sql() {
    scores_outside_unit_interval_are_rejected(sql_store().await.as_ref()).await;
}

#[tokio::test]
async fn scores_outside_unit_interval_are_rejected_kv() {
    scores_outside_unit_interval_are_rejected(kv_store().as_ref()).await;
}

#[tokio::test]
async fn modification_chain_replays_oldest_first() {
    let store = sql_store().await;
    let parent = store
        .insert_subtitle(subtitle("orig.srt", "show.mkv"))
        .await
        .unwrap();

    for (n, kind) in [(1, ModificationType::Sync), (2, ModificationType::ManualEdit)] {
        let mut child = subtitle(&format!("edit{n}.srt"), "show.mkv");
        child.parent_id = Some(parent.id.clone());
        child.modification_type = kind;
        store.insert_subtitle(child).await.unwrap();
    }

    let chain = store.list_subtitles_by_parent(&parent.id).await.unwrap();
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[0].file, "edit1.srt");
    assert_eq!(chain[1].file, "edit2.srt");
}

#[tokio::test]
async fn download_attempts_floor_at_one() {
    let store = sql_store().await;
    let rec = download("a.srt", "a.mkv");
    assert_eq!(rec.download_attempts, 0);

    let saved = store.insert_download(rec).await.unwrap();
    assert_eq!(saved.download_attempts, 1);

    let retry = saved.retry();
    assert_eq!(retry.download_attempts, 2);
    assert!(retry.id.is_empty());
}

#[tokio::test]
async fn media_item_lookup_by_path() {
    let store = sql_store().await;
    let mut item = media("/library/show/s01e03.mkv");
    item.alt_titles = vec!["Alt Title".to_string()];
    store.insert_media_item(item).await.unwrap();

    let got = store.get_media_item("/library/show/s01e03.mkv").await.unwrap();
    assert_eq!(got.alt_titles, vec!["Alt Title".to_string()]);

    let err = store.get_media_item("/missing").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    store
        .delete_media_item("/library/show/s01e03.mkv")
        .await
        .unwrap();
    assert_eq!(store.count_media_items().await.unwrap(), 0);
}

#[tokio::test]
async fn default_profile_is_unique() {
    let store = sql_store().await;

    // Migration seeds one default profile into an empty database.
    let seeded = store.get_default_language_profile().await.unwrap();
    assert!(seeded.is_default);

    let mut second = profile("Nordic");
    second.is_default = true;
    let second = store.create_language_profile(second).await.unwrap();

    let profiles = store.list_language_profiles().await.unwrap();
    let defaults: Vec<_> = profiles.iter().filter(|p| p.is_default).collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].id, second.id);

    store.set_default_language_profile(&seeded.id).await.unwrap();
    let current = store.get_default_language_profile().await.unwrap();
    assert_eq!(current.id, seeded.id);
}

#[tokio::test]
async fn media_profile_falls_back_to_default() {
    let store = sql_store().await;
    let nordic = store
        .create_language_profile(profile("Nordic"))
        .await
        .unwrap();

    let fallback = store.get_media_profile("media-1").await.unwrap();
    assert!(fallback.is_default);

    store
        .assign_profile_to_media("media-1", &nordic.id)
        .await
        .unwrap();
    let assigned = store.get_media_profile("media-1").await.unwrap();
    assert_eq!(assigned.id, nordic.id);

    store.remove_media_profile("media-1").await.unwrap();
    let back = store.get_media_profile("media-1").await.unwrap();
    assert!(back.is_default);
}

#[tokio::test]
async fn tag_filter_requires_every_tag() {
    let store = sql_store().await;
    let keep = store
        .create_tag("keep", "", "", "#00ff00", "")
        .await
        .unwrap();
    let anime = store
        .create_tag("anime", "", "", "#ff0000", "")
        .await
        .unwrap();
    assert_eq!(keep.tag_type, "user");
    assert_eq!(keep.entity_type, "all");

    store.tag_entity(&keep.id, "media", "m1").await.unwrap();
    store.tag_entity(&anime.id, "media", "m1").await.unwrap();
    store.tag_entity(&keep.id, "media", "m2").await.unwrap();

    let both = store
        .filter_by_tags("media", &["keep".to_string(), "anime".to_string()])
        .await
        .unwrap();
    assert_eq!(both, vec!["m1".to_string()]);

    let none = store
        .filter_by_tags("media", &["keep".to_string(), "missing".to_string()])
        .await
        .unwrap();
    assert!(none.is_empty());

    let empty_query = store.filter_by_tags("media", &[]).await.unwrap();
    assert!(empty_query.is_empty());
}

async fn supplied_created_at_survives_insert(store: &dyn SubtitleStore) {
    let stamp = chrono::Utc::now() - chrono::Duration::days(30);

    let mut prof = profile("Archive");
    prof.created_at = Some(stamp);
    let prof = store.create_language_profile(prof).await.unwrap();
    assert_eq!(prof.created_at, Some(stamp));

    let item = store
        .insert_monitored_item(MonitoredItem {
            media_id: "m1".to_string(),
            path: "/library/old.mkv".to_string(),
            languages: vec!["en".to_string()],
            created_at: Some(stamp),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(item.created_at, Some(stamp));

    // The stored copy keeps the stamp too, not just the returned value.
    let listed = store.list_monitored_items().await.unwrap();
    assert_eq!(listed[0].created_at, Some(stamp));
}

#[tokio::test]
async fn supplied_created_at_survives_insert_sql() {
    supplied_created_at_survives_insert(sql_store().await.as_ref()).await;
}

#[tokio::test]
async fn supplied_created_at_survives_insert_kv() {
    supplied_created_at_survives_insert(kv_store().as_ref()).await;
}

#[tokio::test]
async fn bulk_tagging_is_all_or_nothing() {
    let store = sql_store().await;
    let keep = store.create_tag("keep", "", "", "", "").await.unwrap();
    let anime = store.create_tag("anime", "", "", "", "").await.unwrap();

    store
        .tag_entities_bulk(&[
            TagAssignment::new(&keep.id, "media", "m1"),
            TagAssignment::new(&anime.id, "media", "m1"),
        ])
        .await
        .unwrap();
    assert_eq!(
        store.list_tags_for_entity("media", "m1").await.unwrap().len(),
        2
    );

    // One bad id poisons the whole batch; the valid assignment before it
    // must not land either.
    let err = store
        .tag_entities_bulk(&[
            TagAssignment::new(&keep.id, "media", "m2"),
            TagAssignment::new("not-a-tag", "media", "m2"),
        ])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
    assert!(
        store
            .list_tags_for_entity("media", "m2")
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn deleting_a_tag_cascades_associations() {
    let store = sql_store().await;
    let tag = store.create_tag("temp", "", "", "", "").await.unwrap();
    store.tag_entity(&tag.id, "media", "m1").await.unwrap();

    store.delete_tag(&tag.id).await.unwrap();

    assert!(store.list_tags().await.unwrap().is_empty());
    assert!(
        store
            .list_tags_for_entity("media", "m1")
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn monitored_items_become_due_and_reset() {
    let store = sql_store().await;
    let item = store
        .insert_monitored_item(MonitoredItem {
            media_id: "m1".to_string(),
            path: "/library/a.mkv".to_string(),
            languages: vec!["en".to_string()],
            max_retries: 3,
            ..Default::default()
        })
        .await
        .unwrap();

    // Never checked, so due for any interval.
    let due = store
        .get_monitored_items_to_check(chrono::Duration::hours(6))
        .await
        .unwrap();
    assert_eq!(due.len(), 1);

    let mut checked = item.clone();
    checked.record_check(false);
    store.update_monitored_item(checked).await.unwrap();

    let due = store
        .get_monitored_items_to_check(chrono::Duration::hours(6))
        .await
        .unwrap();
    assert!(due.is_empty());

    let mut blacklisted = store.list_monitored_items().await.unwrap().remove(0);
    blacklisted.status = MonitorStatus::Blacklisted;
    store.update_monitored_item(blacklisted).await.unwrap();

    store.reset_monitored_item(&item.id).await.unwrap();
    let after = store.list_monitored_items().await.unwrap().remove(0);
    assert_eq!(after.status, MonitorStatus::Pending);
    assert_eq!(after.retry_count, 0);
}

#[tokio::test]
async fn cross_backend_migration_copies_every_family() {
    let src = sql_store().await;
    let dst = kv_store();

    src.insert_subtitle(subtitle("a.srt", "a.mkv")).await.unwrap();
    src.insert_subtitle(subtitle("b.srt", "b.mkv")).await.unwrap();
    src.insert_download(download("a.srt", "a.mkv")).await.unwrap();
    src.insert_media_item(media("/library/a.mkv")).await.unwrap();

    let summary = copy_store(src.as_ref(), dst.as_ref()).await.unwrap();
    assert_eq!(summary.subtitles, 2);
    assert_eq!(summary.downloads, 1);
    assert_eq!(summary.media_items, 1);
    assert_eq!(summary.total(), 4);

    assert_eq!(dst.count_subtitles().await.unwrap(), 2);
    assert_eq!(dst.count_downloads().await.unwrap(), 1);
    assert_eq!(dst.count_media_items().await.unwrap(), 1);
}

#[tokio::test]
async fn migration_runs_kv_to_sql_as_well() {
    let src = kv_store();
    let dst = sql_store().await;

    src.insert_subtitle(subtitle("a.srt", "a.mkv")).await.unwrap();
    src.insert_media_item(media("/library/a.mkv")).await.unwrap();

    let summary = copy_store(src.as_ref(), dst.as_ref()).await.unwrap();
    assert_eq!(summary.subtitles, 1);
    assert_eq!(summary.media_items, 1);
    assert_eq!(dst.count_subtitles().await.unwrap(), 1);
}

#[tokio::test]
async fn unknown_backend_names_the_alternative() {
    match open_store(":memory:", "postgres").await {
        Err(StoreError::Unsupported {
            requested,
            alternative,
        }) => {
            assert_eq!(requested, "postgres");
            assert_eq!(alternative, "sqlite");
        }
        Err(other) => panic!("expected Unsupported, got {other:?}"),
        Ok(_) => panic!("expected Unsupported, store opened"),
    }
}

#[tokio::test]
async fn redb_store_persists_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.redb");
    let location = path.to_string_lossy().into_owned();

    {
        let store = open_store(&location, "redb").await.unwrap();
        store
            .insert_subtitle(subtitle("a.srt", "a.mkv"))
            .await
            .unwrap();
        store.close().await.unwrap();
    }

    let reopened = open_store(&location, "pebble").await.unwrap();
    assert_eq!(reopened.count_subtitles().await.unwrap(), 1);
}

#[tokio::test]
async fn schema_migration_is_idempotent_across_opens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("subarr.db");
    let location = path.to_string_lossy().into_owned();

    {
        let store = SqlStore::new(&location).await.unwrap();
        store
            .insert_subtitle(subtitle("a.srt", "a.mkv"))
            .await
            .unwrap();
    }

    // Second open replays the migrator against the existing schema.
    let store = SqlStore::new(&location).await.unwrap();
    assert_eq!(store.count_subtitles().await.unwrap(), 1);
}
