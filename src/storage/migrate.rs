//! Cross-backend copy tool.
//!
//! Works purely through the [`SubtitleStore`] contract, so any source backend
//! can feed any destination backend. The copy is sequential and fail-fast:
//! the first insert error aborts the run and is returned verbatim, leaving
//! already-copied records in place. No deduplication is attempted; running
//! the tool twice appends duplicates. This is an offline, operator-triggered
//! path, not live replication.

use tracing::info;

use super::{StoreResult, SubtitleStore};

/// Per-family record counts for one completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    pub subtitles: usize,
    pub downloads: usize,
    pub media_items: usize,
}

impl MigrationSummary {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.subtitles + self.downloads + self.media_items
    }
}

/// Copies every entity family from `src` into `dst`.
///
/// Families are copied in dependency order (subtitles, downloads, media
/// items) so any lookups against earlier families see their data. IDs are
/// reassigned by the destination engine; natural keys are preserved.
pub async fn copy_store(
    src: &dyn SubtitleStore,
    dst: &dyn SubtitleStore,
) -> StoreResult<MigrationSummary> {
    let mut summary = MigrationSummary::default();

    for sub in src.list_subtitles().await? {
        dst.insert_subtitle(sub).await?;
        summary.subtitles += 1;
    }
    info!(count = summary.subtitles, "copied subtitles");

    for dl in src.list_downloads().await? {
        dst.insert_download(dl).await?;
        summary.downloads += 1;
    }
    info!(count = summary.downloads, "copied downloads");

    for item in src.list_media_items().await? {
        dst.insert_media_item(item).await?;
        summary.media_items += 1;
    }
    info!(count = summary.media_items, "copied media items");

    Ok(summary)
}
