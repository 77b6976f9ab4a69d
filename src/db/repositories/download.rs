use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use crate::db::parse_ts;
use crate::entities::{downloads, prelude::*};
use crate::models::DownloadRecord;
use crate::storage::StoreResult;

pub struct DownloadRepository {
    conn: DatabaseConnection,
}

impl DownloadRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn to_domain(m: downloads::Model) -> StoreResult<DownloadRecord> {
        Ok(DownloadRecord {
            id: m.id.to_string(),
            file: m.file,
            video_file: m.video_file,
            provider: m.provider,
            language: m.language,
            search_query: m.search_query,
            match_score: m.match_score,
            download_attempts: u32::try_from(m.download_attempts.max(1)).unwrap_or(1),
            error_message: m.error_message,
            response_time_ms: m.response_time_ms,
            created_at: Some(parse_ts(&m.created_at)?),
        })
    }

    fn collect(rows: Vec<downloads::Model>) -> StoreResult<Vec<DownloadRecord>> {
        rows.into_iter().map(Self::to_domain).collect()
    }

    pub async fn insert(&self, rec: DownloadRecord) -> StoreResult<DownloadRecord> {
        rec.validate()?;
        let created = rec.created_at_or_now();

        let active = downloads::ActiveModel {
            file: Set(rec.file.clone()),
            video_file: Set(rec.video_file.clone()),
            provider: Set(rec.provider.clone()),
            language: Set(rec.language.clone()),
            search_query: Set(rec.search_query.clone()),
            match_score: Set(rec.match_score),
            download_attempts: Set(i32::try_from(rec.attempts_or_one()).unwrap_or(i32::MAX)),
            error_message: Set(rec.error_message.clone()),
            response_time_ms: Set(rec.response_time_ms),
            created_at: Set(created.to_rfc3339()),
            ..Default::default()
        };

        let result = Downloads::insert(active).exec(&self.conn).await?;

        let mut out = rec;
        out.id = result.last_insert_id.to_string();
        out.download_attempts = out.attempts_or_one();
        out.created_at = Some(created);
        Ok(out)
    }

    pub async fn list_all(&self) -> StoreResult<Vec<DownloadRecord>> {
        let rows = Downloads::find()
            .order_by_desc(downloads::Column::Id)
            .all(&self.conn)
            .await?;
        Self::collect(rows)
    }

    pub async fn list_for_video(&self, video_file: &str) -> StoreResult<Vec<DownloadRecord>> {
        let rows = Downloads::find()
            .filter(downloads::Column::VideoFile.eq(video_file))
            .order_by_desc(downloads::Column::Id)
            .all(&self.conn)
            .await?;
        Self::collect(rows)
    }

    pub async fn count(&self) -> StoreResult<u64> {
        Ok(Downloads::find().count(&self.conn).await?)
    }

    pub async fn delete_for_file(&self, file: &str) -> StoreResult<()> {
        Downloads::delete_many()
            .filter(downloads::Column::File.eq(file))
            .exec(&self.conn)
            .await?;
        Ok(())
    }
}
