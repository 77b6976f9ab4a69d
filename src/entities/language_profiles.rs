use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "language_profiles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    /// JSON array of `{language, priority, forced, hi}` entries.
    pub languages: String,
    pub cutoff_score: i32,
    pub is_default: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::media_profiles::Entity")]
    MediaProfiles,
}

impl Related<super::media_profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MediaProfiles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
