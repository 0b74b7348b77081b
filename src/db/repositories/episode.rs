use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{episode_progress, episodes, prelude::*};
use crate::models::episode::{ParsedEpisode, ProgressUpdate};

/// Repository for episodes and per-user watch progress
pub struct EpisodeRepository {
    conn: DatabaseConnection,
}

impl EpisodeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<episodes::Model>> {
        Ok(Episodes::find_by_id(id).one(&self.conn).await?)
    }

    pub async fn list_by_title_id(&self, title_id: Uuid) -> Result<Vec<episodes::Model>> {
        let rows = Episodes::find()
            .filter(episodes::Column::TitleId.eq(title_id))
            .order_by_asc(episodes::Column::Number)
            .order_by_asc(episodes::Column::CreatedAt)
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn get_by_website_id(
        &self,
        title_id: Uuid,
        id_on_website: &str,
    ) -> Result<Option<episodes::Model>> {
        let row = Episodes::find()
            .filter(episodes::Column::TitleId.eq(title_id))
            .filter(episodes::Column::IdOnWebsite.eq(id_on_website))
            .one(&self.conn)
            .await?;
        Ok(row)
    }

    pub async fn create(&self, title_id: Uuid, episode: &ParsedEpisode) -> Result<episodes::Model> {
        let active_model = episodes::ActiveModel {
            id: Set(Uuid::new_v4()),
            title_id: Set(title_id),
            id_on_website: Set(episode.id_on_website.clone()),
            name: Set(episode.name.clone()),
            number: Set(episode.number),
            created_at: Set(Utc::now()),
        };

        active_model
            .insert(&self.conn)
            .await
            .context("Failed to insert episode")
    }

    pub async fn update(
        &self,
        db_episode: episodes::Model,
        episode: &ParsedEpisode,
    ) -> Result<episodes::Model> {
        let mut active: episodes::ActiveModel = db_episode.into();
        active.name = Set(episode.name.clone());
        if episode.number.is_some() {
            active.number = Set(episode.number);
        }
        Ok(active.update(&self.conn).await?)
    }

    pub async fn get_progress(
        &self,
        user_id: Uuid,
        episode_id: Uuid,
    ) -> Result<Option<episode_progress::Model>> {
        let row = EpisodeProgress::find()
            .filter(episode_progress::Column::UserId.eq(user_id))
            .filter(episode_progress::Column::EpisodeId.eq(episode_id))
            .one(&self.conn)
            .await?;
        Ok(row)
    }

    pub async fn upsert_progress(
        &self,
        user_id: Uuid,
        episode_id: Uuid,
        update: ProgressUpdate,
    ) -> Result<episode_progress::Model> {
        let now = Utc::now();

        if let Some(existing) = self.get_progress(user_id, episode_id).await? {
            let mut active: episode_progress::ActiveModel = existing.into();
            active.seconds = Set(update.seconds);
            active.completed = Set(update.completed);
            active.updated_at = Set(now);
            return Ok(active.update(&self.conn).await?);
        }

        let active_model = episode_progress::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            episode_id: Set(episode_id),
            seconds: Set(update.seconds),
            completed: Set(update.completed),
            updated_at: Set(now),
        };

        Ok(active_model.insert(&self.conn).await?)
    }
}
