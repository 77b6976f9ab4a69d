use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "media_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub path: String,
    pub title: String,
    pub season: i32,
    pub episode: i32,
    pub release_group: String,
    /// JSON array of alternative titles.
    pub alt_titles: Option<String>,
    /// JSON object naming display fields the user overrode by hand.
    pub field_locks: Option<String>,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
