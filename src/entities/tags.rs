use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub tag_type: String,
    /// Advisory scope hint; "all" unless the tag is entity-specific.
    pub entity_type: String,
    pub color: String,
    pub description: String,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tag_associations::Entity")]
    TagAssociations,
}

impl Related<super::tag_associations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TagAssociations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
