use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use crate::db::parse_ts;
use crate::entities::{media_items, prelude::*};
use crate::models::MediaItem;
use crate::storage::{StoreError, StoreResult};

pub struct MediaRepository {
    conn: DatabaseConnection,
}

impl MediaRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn to_domain(m: media_items::Model) -> StoreResult<MediaItem> {
        let alt_titles = match m.alt_titles {
            None => Vec::new(),
            Some(raw) => serde_json::from_str(&raw)?,
        };
        let field_locks = match m.field_locks {
            None => None,
            Some(raw) => Some(serde_json::from_str(&raw)?),
        };
        Ok(MediaItem {
            id: m.id.to_string(),
            path: m.path,
            title: m.title,
            season: m.season,
            episode: m.episode,
            release_group: m.release_group,
            alt_titles,
            field_locks,
            created_at: Some(parse_ts(&m.created_at)?),
        })
    }

    fn collect(rows: Vec<media_items::Model>) -> StoreResult<Vec<MediaItem>> {
        rows.into_iter().map(Self::to_domain).collect()
    }

    pub async fn insert(&self, item: MediaItem) -> StoreResult<MediaItem> {
        item.validate()?;
        let created = item.created_at_or_now();

        let active = media_items::ActiveModel {
            path: Set(item.path.clone()),
            title: Set(item.title.clone()),
            season: Set(item.season),
            episode: Set(item.episode),
            release_group: Set(item.release_group.clone()),
            alt_titles: Set(Some(serde_json::to_string(&item.alt_titles)?)),
            field_locks: Set(item
                .field_locks
                .as_ref()
                .map(std::string::ToString::to_string)),
            created_at: Set(created.to_rfc3339()),
            ..Default::default()
        };

        let result = MediaItems::insert(active).exec(&self.conn).await?;

        let mut out = item;
        out.id = result.last_insert_id.to_string();
        out.created_at = Some(created);
        Ok(out)
    }

    pub async fn list_all(&self) -> StoreResult<Vec<MediaItem>> {
        let rows = MediaItems::find()
            .order_by_desc(media_items::Column::Id)
            .all(&self.conn)
            .await?;
        Self::collect(rows)
    }

    pub async fn get_by_path(&self, path: &str) -> StoreResult<MediaItem> {
        let row = MediaItems::find()
            .filter(media_items::Column::Path.eq(path))
            .order_by_desc(media_items::Column::Id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| StoreError::not_found("media item", path))?;
        Self::to_domain(row)
    }

    pub async fn count(&self) -> StoreResult<u64> {
        Ok(MediaItems::find().count(&self.conn).await?)
    }

    pub async fn delete_by_path(&self, path: &str) -> StoreResult<()> {
        MediaItems::delete_many()
            .filter(media_items::Column::Path.eq(path))
            .exec(&self.conn)
            .await?;
        Ok(())
    }
}
