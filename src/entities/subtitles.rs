use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "subtitles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub file: String,
    #[sea_orm(indexed)]
    pub video_file: String,
    pub release: String,
    pub language: String,
    pub service: String,
    pub embedded: bool,
    pub source_url: Option<String>,
    /// Opaque provider payload, stored as JSON text.
    pub provider_metadata: Option<String>,
    pub confidence_score: Option<f64>,
    /// ID of the subtitle this one was derived from, if any.
    pub parent_id: Option<String>,
    pub modification_type: Option<String>,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
