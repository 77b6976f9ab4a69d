use sea_orm::entity::prelude::*;

/// One profile binding per media item; re-assignment overwrites the row.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "media_profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub media_id: String,
    pub profile_id: i32,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::language_profiles::Entity",
        from = "Column::ProfileId",
        to = "super::language_profiles::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    LanguageProfiles,
}

impl Related<super::language_profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LanguageProfiles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
