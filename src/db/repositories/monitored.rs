use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::db::{now_rfc3339, parse_ts};
use crate::entities::{monitored_items, prelude::*};
use crate::models::{MonitorStatus, MonitoredItem};
use crate::storage::{StoreError, StoreResult};

pub struct MonitoredRepository {
    conn: DatabaseConnection,
}

impl MonitoredRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn to_domain(m: monitored_items::Model) -> StoreResult<MonitoredItem> {
        let last_checked = match m.last_checked {
            None => None,
            Some(raw) => Some(parse_ts(&raw)?),
        };
        Ok(MonitoredItem {
            id: m.id.to_string(),
            media_id: m.media_id,
            path: m.path,
            languages: serde_json::from_str(&m.languages)?,
            last_checked,
            status: MonitorStatus::parse(&m.status),
            retry_count: u32::try_from(m.retry_count.max(0)).unwrap_or(0),
            max_retries: u32::try_from(m.max_retries.max(0)).unwrap_or(0),
            created_at: Some(parse_ts(&m.created_at)?),
            updated_at: Some(parse_ts(&m.updated_at)?),
        })
    }

    fn collect(rows: Vec<monitored_items::Model>) -> StoreResult<Vec<MonitoredItem>> {
        rows.into_iter().map(Self::to_domain).collect()
    }

    fn parse_item_id(item_id: &str) -> StoreResult<i32> {
        item_id
            .parse()
            .map_err(|_| StoreError::not_found("monitored item", item_id))
    }

    pub async fn insert(&self, item: MonitoredItem) -> StoreResult<MonitoredItem> {
        item.validate()?;
        let created = item.created_at_or_now().to_rfc3339();

        let active = monitored_items::ActiveModel {
            media_id: Set(item.media_id.clone()),
            path: Set(item.path.clone()),
            languages: Set(serde_json::to_string(&item.languages)?),
            last_checked: Set(item.last_checked.map(|t| t.to_rfc3339())),
            status: Set(item.status.to_string()),
            retry_count: Set(i32::try_from(item.retry_count).unwrap_or(i32::MAX)),
            max_retries: Set(i32::try_from(item.max_retries).unwrap_or(i32::MAX)),
            created_at: Set(created),
            updated_at: Set(now_rfc3339()),
            ..Default::default()
        };

        let result = MonitoredItems::insert(active).exec(&self.conn).await?;
        let row = MonitoredItems::find_by_id(result.last_insert_id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| StoreError::Driver("created monitored row disappeared".into()))?;
        Self::to_domain(row)
    }

    pub async fn list_all(&self) -> StoreResult<Vec<MonitoredItem>> {
        let rows = MonitoredItems::find()
            .order_by_desc(monitored_items::Column::Id)
            .all(&self.conn)
            .await?;
        Self::collect(rows)
    }

    pub async fn update(&self, item: &MonitoredItem) -> StoreResult<MonitoredItem> {
        item.validate()?;
        let id = Self::parse_item_id(&item.id)?;

        let row = MonitoredItems::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| StoreError::not_found("monitored item", &item.id))?;

        let mut active: monitored_items::ActiveModel = row.into();
        active.media_id = Set(item.media_id.clone());
        active.path = Set(item.path.clone());
        active.languages = Set(serde_json::to_string(&item.languages)?);
        active.last_checked = Set(item.last_checked.map(|t| t.to_rfc3339()));
        active.status = Set(item.status.to_string());
        active.retry_count = Set(i32::try_from(item.retry_count).unwrap_or(i32::MAX));
        active.max_retries = Set(i32::try_from(item.max_retries).unwrap_or(i32::MAX));
        active.updated_at = Set(now_rfc3339());

        let updated = active.update(&self.conn).await?;
        Self::to_domain(updated)
    }

    pub async fn delete(&self, item_id: &str) -> StoreResult<()> {
        let id = Self::parse_item_id(item_id)?;
        MonitoredItems::delete_by_id(id).exec(&self.conn).await?;
        Ok(())
    }

    /// Items whose last check is older than the cutoff, or which were never
    /// checked at all. Terminal states are excluded.
    pub async fn due_for_check(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<MonitoredItem>> {
        let rows = MonitoredItems::find()
            .filter(
                monitored_items::Column::Status.is_in([
                    MonitorStatus::Pending.as_str(),
                    MonitorStatus::Monitoring.as_str(),
                ]),
            )
            .filter(
                Condition::any()
                    .add(monitored_items::Column::LastChecked.is_null())
                    .add(monitored_items::Column::LastChecked.lt(cutoff.to_rfc3339())),
            )
            .order_by_asc(monitored_items::Column::Id)
            .all(&self.conn)
            .await?;
        Self::collect(rows)
    }

    pub async fn reset(&self, item_id: &str) -> StoreResult<MonitoredItem> {
        let id = Self::parse_item_id(item_id)?;

        let row = MonitoredItems::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| StoreError::not_found("monitored item", item_id))?;

        let mut item = Self::to_domain(row)?;
        item.reset();
        self.update(&item).await
    }
}
