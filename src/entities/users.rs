use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub email: String,

    pub name: Option<String>,

    pub avatar_url: Option<String>,

    /// Argon2id password hash, absent for accounts created through Google.
    pub password_hash: Option<String>,

    /// Random API key (64-char hex string)
    #[sea_orm(unique)]
    pub api_key: String,

    pub is_superuser: bool,

    pub is_active: bool,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::favorite_titles::Entity")]
    FavoriteTitles,
    #[sea_orm(has_many = "super::episode_progress::Entity")]
    EpisodeProgress,
    #[sea_orm(has_many = "super::files::Entity")]
    Files,
    #[sea_orm(has_many = "super::messages::Entity")]
    Messages,
}

impl Related<super::favorite_titles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FavoriteTitles.def()
    }
}

impl Related<super::episode_progress::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EpisodeProgress.def()
    }
}

impl Related<super::files::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Files.def()
    }
}

impl Related<super::messages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
