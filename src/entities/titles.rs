use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "titles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Native id of the title on the parser's website.
    pub id_on_website: String,
    pub parser_id: String,
    pub name: String,
    pub en_name: Option<String>,
    /// Lowercased copies of the names, matched by search.
    pub name_search: String,
    pub en_name_search: Option<String>,
    pub image_url: Option<String>,
    pub shikimori_id: Option<i64>,
    pub shikimori_fetched: bool,
    pub shikimori_fetched_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::parsers::Entity",
        from = "Column::ParserId",
        to = "super::parsers::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Parsers,
    #[sea_orm(has_many = "super::episodes::Entity")]
    Episodes,
    #[sea_orm(has_many = "super::related_titles::Entity")]
    RelatedTitles,
    #[sea_orm(has_many = "super::favorite_titles::Entity")]
    FavoriteTitles,
    #[sea_orm(has_many = "super::title_genres::Entity")]
    TitleGenres,
    #[sea_orm(has_many = "super::messages::Entity")]
    Messages,
}

impl Related<super::parsers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Parsers.def()
    }
}

impl Related<super::episodes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Episodes.def()
    }
}

impl Related<super::related_titles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RelatedTitles.def()
    }
}

impl Related<super::favorite_titles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FavoriteTitles.def()
    }
}

impl Related<super::title_genres::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TitleGenres.def()
    }
}

impl Related<super::genres::Entity> for Entity {
    fn to() -> RelationDef {
        super::title_genres::Relation::Genres.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::title_genres::Relation::Titles.def().rev())
    }
}

impl Related<super::messages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
