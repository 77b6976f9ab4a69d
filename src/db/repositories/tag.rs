use std::collections::{HashMap, HashSet};

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::db::{now_rfc3339, parse_ts};
use crate::entities::{prelude::*, tag_associations, tags};
use crate::models::{Tag, TagAssignment};
use crate::storage::{StoreError, StoreResult};

pub struct TagRepository {
    conn: DatabaseConnection,
}

impl TagRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn to_domain(m: tags::Model) -> StoreResult<Tag> {
        Ok(Tag {
            id: m.id.to_string(),
            name: m.name,
            tag_type: m.tag_type,
            entity_type: m.entity_type,
            color: m.color,
            description: m.description,
            created_at: Some(parse_ts(&m.created_at)?),
        })
    }

    fn parse_tag_id(tag_id: &str) -> StoreResult<i32> {
        tag_id
            .parse()
            .map_err(|_| StoreError::not_found("tag", tag_id))
    }

    pub async fn create(
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

        let tag_type = if tag_type.is_empty() { "user" } else { tag_type };
        let entity_type = if entity_type.is_empty() {
            "all"
        } else {
            entity_type
        };

        let active = tags::ActiveModel {
            name: Set(name.to_string()),
            tag_type: Set(tag_type.to_string()),
            entity_type: Set(entity_type.to_string()),
            color: Set(color.to_string()),
            description: Set(description.to_string()),
            created_at: Set(now_rfc3339()),
            ..Default::default()
        };

        let result = Tags::insert(active).exec(&self.conn).await?;
        let row = Tags::find_by_id(result.last_insert_id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| StoreError::Driver("created tag row disappeared".into()))?;
        Self::to_domain(row)
    }

    pub async fn list_all(&self) -> StoreResult<Vec<Tag>> {
        let rows = Tags::find()
            .order_by_desc(tags::Column::Id)
            .all(&self.conn)
            .await?;
        rows.into_iter().map(Self::to_domain).collect()
    }

    pub async fn delete(&self, tag_id: &str) -> StoreResult<()> {
        let id = Self::parse_tag_id(tag_id)?;
        let txn = self.conn.begin().await?;

        TagAssociations::delete_many()
            .filter(tag_associations::Column::TagId.eq(id))
            .exec(&txn)
            .await?;
        Tags::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    pub async fn assign(
        &self,
        tag_id: &str,
        entity_type: &str,
        entity_id: &str,
    ) -> StoreResult<()> {
        let id = Self::parse_tag_id(tag_id)?;

        let active = tag_associations::ActiveModel {
            tag_id: Set(id),
            entity_type: Set(entity_type.to_string()),
            entity_id: Set(entity_id.to_string()),
            created_at: Set(now_rfc3339()),
        };

        // Re-tagging the same entity is a no-op, not an error.
        TagAssociations::insert(active)
            .on_conflict(
                sea_orm::sea_query::OnConflict::columns([
                    tag_associations::Column::TagId,
                    tag_associations::Column::EntityType,
                    tag_associations::Column::EntityId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        Ok(())
    }

    pub async fn unassign(
        &self,
        tag_id: &str,
        entity_type: &str,
        entity_id: &str,
    ) -> StoreResult<()> {
        let id = Self::parse_tag_id(tag_id)?;

        TagAssociations::delete_many()
            .filter(tag_associations::Column::TagId.eq(id))
            .filter(tag_associations::Column::EntityType.eq(entity_type))
            .filter(tag_associations::Column::EntityId.eq(entity_id))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    /// All assignments land in one transaction so a failure cannot leave a
    /// partially-tagged graph behind.
    pub async fn assign_bulk(&self, assignments: &[TagAssignment]) -> StoreResult<()> {
        if assignments.is_empty() {
            return Ok(());
        }

        let txn = self.conn.begin().await?;
        for assignment in assignments {
            let id = Self::parse_tag_id(&assignment.tag_id)?;
            let active = tag_associations::ActiveModel {
                tag_id: Set(id),
                entity_type: Set(assignment.entity_type.clone()),
                entity_id: Set(assignment.entity_id.clone()),
                created_at: Set(now_rfc3339()),
            };
            TagAssociations::insert(active)
                .on_conflict(
                    sea_orm::sea_query::OnConflict::columns([
                        tag_associations::Column::TagId,
                        tag_associations::Column::EntityType,
                        tag_associations::Column::EntityId,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
        }
        txn.commit().await?;
        Ok(())
    }

    pub async fn tags_for_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> StoreResult<Vec<Tag>> {
        let assoc_rows = TagAssociations::find()
            .filter(tag_associations::Column::EntityType.eq(entity_type))
            .filter(tag_associations::Column::EntityId.eq(entity_id))
            .all(&self.conn)
            .await?;

        if assoc_rows.is_empty() {
            return Ok(Vec::new());
        }

        let tag_ids: Vec<i32> = assoc_rows.iter().map(|a| a.tag_id).collect();
        let rows = Tags::find()
            .filter(tags::Column::Id.is_in(tag_ids))
            .order_by_desc(tags::Column::Id)
            .all(&self.conn)
            .await?;
        rows.into_iter().map(Self::to_domain).collect()
    }

    /// AND filter: only entities carrying every named tag qualify. A name
    /// with no tag row can never be satisfied, so the result is empty, as is
    /// the zero-names query.
    pub async fn filter_by_tags(
        &self,
        entity_type: &str,
        tag_names: &[String],
    ) -> StoreResult<Vec<String>> {
        let wanted: HashSet<&str> = tag_names.iter().map(String::as_str).collect();
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        let tag_rows = Tags::find()
            .filter(tags::Column::Name.is_in(wanted.iter().copied()))
            .all(&self.conn)
            .await?;
        if tag_rows.len() < wanted.len() {
            return Ok(Vec::new());
        }
        let wanted_ids: HashSet<i32> = tag_rows.iter().map(|t| t.id).collect();

        let assoc_rows = TagAssociations::find()
            .filter(tag_associations::Column::EntityType.eq(entity_type))
            .filter(tag_associations::Column::TagId.is_in(wanted_ids.iter().copied()))
            .all(&self.conn)
            .await?;

        let mut coverage: HashMap<String, HashSet<i32>> = HashMap::new();
        for assoc in assoc_rows {
            coverage
                .entry(assoc.entity_id)
                .or_default()
                .insert(assoc.tag_id);
        }

        let mut matches: Vec<String> = coverage
            .into_iter()
            .filter(|(_, tag_ids)| tag_ids.len() == wanted_ids.len())
            .map(|(entity_id, _)| entity_id)
            .collect();
        matches.sort();
        Ok(matches)
    }
}
