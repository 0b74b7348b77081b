use sea_orm::entity::prelude::*;

/// A group of per-parser titles that are the same anime.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "related_links")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::related_titles::Entity")]
    RelatedTitles,
}

impl Related<super::related_titles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RelatedTitles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
