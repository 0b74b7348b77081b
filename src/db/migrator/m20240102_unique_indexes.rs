use crate::entities::{episode_progress, episodes, messages, related_titles, titles};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const IDX_TITLES_PARSER_WEBSITE: &str = "idx_titles_parser_website_unique";
const IDX_EPISODES_TITLE_WEBSITE: &str = "idx_episodes_title_website_unique";
const IDX_PROGRESS_USER_EPISODE: &str = "idx_episode_progress_user_episode_unique";
const IDX_RELATED_LINK_TITLE: &str = "idx_related_titles_link_title_unique";
const IDX_TITLES_SHIKIMORI: &str = "idx_titles_shikimori_id";
const IDX_MESSAGES_TITLE: &str = "idx_messages_title_id";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name(IDX_TITLES_PARSER_WEBSITE)
                    .table(titles::Entity)
                    .col(titles::Column::ParserId)
                    .col(titles::Column::IdOnWebsite)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name(IDX_TITLES_SHIKIMORI)
                    .table(titles::Entity)
                    .col(titles::Column::ShikimoriId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name(IDX_EPISODES_TITLE_WEBSITE)
                    .table(episodes::Entity)
                    .col(episodes::Column::TitleId)
                    .col(episodes::Column::IdOnWebsite)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name(IDX_PROGRESS_USER_EPISODE)
                    .table(episode_progress::Entity)
                    .col(episode_progress::Column::UserId)
                    .col(episode_progress::Column::EpisodeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name(IDX_RELATED_LINK_TITLE)
                    .table(related_titles::Entity)
                    .col(related_titles::Column::LinkId)
                    .col(related_titles::Column::TitleId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name(IDX_MESSAGES_TITLE)
                    .table(messages::Entity)
                    .col(messages::Column::TitleId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table) in [
            (IDX_MESSAGES_TITLE, messages::Entity.into_table_ref()),
            (IDX_RELATED_LINK_TITLE, related_titles::Entity.into_table_ref()),
            (IDX_PROGRESS_USER_EPISODE, episode_progress::Entity.into_table_ref()),
            (IDX_EPISODES_TITLE_WEBSITE, episodes::Entity.into_table_ref()),
            (IDX_TITLES_SHIKIMORI, titles::Entity.into_table_ref()),
            (IDX_TITLES_PARSER_WEBSITE, titles::Entity.into_table_ref()),
        ] {
            manager
                .drop_index(Index::drop().name(name).table(table).to_owned())
                .await?;
        }

        Ok(())
    }
}
