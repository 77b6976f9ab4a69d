use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use crate::db::parse_ts;
use crate::entities::{prelude::*, subtitles};
use crate::models::{ModificationType, SubtitleRecord};
use crate::storage::StoreResult;

pub struct SubtitleRepository {
    conn: DatabaseConnection,
}

impl SubtitleRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn to_domain(m: subtitles::Model) -> StoreResult<SubtitleRecord> {
        let provider_metadata = match m.provider_metadata {
            None => None,
            Some(raw) => Some(serde_json::from_str(&raw)?),
        };
        Ok(SubtitleRecord {
            id: m.id.to_string(),
            file: m.file,
            video_file: m.video_file,
            release: m.release,
            language: m.language,
            service: m.service,
            embedded: m.embedded,
            source_url: m.source_url,
            provider_metadata,
            confidence_score: m.confidence_score,
            parent_id: m.parent_id,
            modification_type: ModificationType::parse(
                m.modification_type.as_deref().unwrap_or("original"),
            ),
            created_at: Some(parse_ts(&m.created_at)?),
        })
    }

    fn collect(rows: Vec<subtitles::Model>) -> StoreResult<Vec<SubtitleRecord>> {
        rows.into_iter().map(Self::to_domain).collect()
    }

    pub async fn insert(&self, rec: SubtitleRecord) -> StoreResult<SubtitleRecord> {
        rec.validate()?;
        let created = rec.created_at_or_now();

        let active = subtitles::ActiveModel {
            file: Set(rec.file.clone()),
            video_file: Set(rec.video_file.clone()),
            release: Set(rec.release.clone()),
            language: Set(rec.language.clone()),
            service: Set(rec.service.clone()),
            embedded: Set(rec.embedded),
            source_url: Set(rec.source_url.clone()),
            provider_metadata: Set(rec
                .provider_metadata
                .as_ref()
                .map(std::string::ToString::to_string)),
            confidence_score: Set(rec.confidence_score),
            parent_id: Set(rec.parent_id.clone()),
            modification_type: Set(Some(rec.modification_type.to_string())),
            created_at: Set(created.to_rfc3339()),
            ..Default::default()
        };

        let result = Subtitles::insert(active).exec(&self.conn).await?;

        let mut out = rec;
        out.id = result.last_insert_id.to_string();
        out.created_at = Some(created);
        Ok(out)
    }

    pub async fn list_all(&self) -> StoreResult<Vec<SubtitleRecord>> {
        let rows = Subtitles::find()
            .order_by_desc(subtitles::Column::Id)
            .all(&self.conn)
            .await?;
        Self::collect(rows)
    }

    pub async fn list_for_video(&self, video_file: &str) -> StoreResult<Vec<SubtitleRecord>> {
        let rows = Subtitles::find()
            .filter(subtitles::Column::VideoFile.eq(video_file))
            .order_by_desc(subtitles::Column::Id)
            .all(&self.conn)
            .await?;
        Self::collect(rows)
    }

    pub async fn list_by_parent(&self, parent_id: &str) -> StoreResult<Vec<SubtitleRecord>> {
        let rows = Subtitles::find()
            .filter(subtitles::Column::ParentId.eq(parent_id))
            .order_by_asc(subtitles::Column::Id)
            .all(&self.conn)
            .await?;
        Self::collect(rows)
    }

    pub async fn count(&self) -> StoreResult<u64> {
        Ok(Subtitles::find().count(&self.conn).await?)
    }

    pub async fn delete_for_file(&self, file: &str) -> StoreResult<()> {
        Subtitles::delete_many()
            .filter(subtitles::Column::File.eq(file))
            .exec(&self.conn)
            .await?;
        Ok(())
    }
}
