use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "downloads")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub file: String,
    #[sea_orm(indexed)]
    pub video_file: String,
    pub provider: String,
    pub language: String,
    pub search_query: String,
    pub match_score: Option<f64>,
    pub download_attempts: i32,
    pub error_message: String,
    pub response_time_ms: Option<i64>,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
