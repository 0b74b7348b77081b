use anyhow::Result;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::pagination::{Page, paginate};
use crate::entities::{messages, prelude::*};

pub struct MessageRepository {
    conn: DatabaseConnection,
}

impl MessageRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, user_id: Uuid, title_id: Uuid, text: &str) -> Result<messages::Model> {
        let active_model = messages::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            title_id: Set(title_id),
            text: Set(text.to_string()),
            created_at: Set(Utc::now()),
        };

        Ok(active_model.insert(&self.conn).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<messages::Model>> {
        Ok(Messages::find_by_id(id).one(&self.conn).await?)
    }

    /// Messages posted on a title, newest first.
    pub async fn list_by_title_id(
        &self,
        title_id: Uuid,
        page: u64,
        page_size: u64,
    ) -> Result<Page<messages::Model>> {
        let query = Messages::find()
            .filter(messages::Column::TitleId.eq(title_id))
            .order_by_desc(messages::Column::CreatedAt);

        paginate(&self.conn, query, page, page_size).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = Messages::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }
}
