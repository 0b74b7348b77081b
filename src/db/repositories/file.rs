use anyhow::Result;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use crate::entities::{files, prelude::*};

/// Metadata of a stored upload.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub storage_key: String,
}

pub struct FileRepository {
    conn: DatabaseConnection,
}

impl FileRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, file: NewFile) -> Result<files::Model> {
        let active_model = files::ActiveModel {
            id: Set(file.id),
            user_id: Set(file.user_id),
            filename: Set(file.filename),
            content_type: Set(file.content_type),
            size: Set(file.size),
            storage_key: Set(file.storage_key),
            created_at: Set(Utc::now()),
        };

        Ok(active_model.insert(&self.conn).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<files::Model>> {
        Ok(Files::find_by_id(id).one(&self.conn).await?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = Files::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }
}
