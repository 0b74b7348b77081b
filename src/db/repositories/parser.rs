use anyhow::Result;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, Set};
use tracing::info;

use crate::entities::{parsers, prelude::*};

pub struct ParserRepository {
    conn: DatabaseConnection,
}

impl ParserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<parsers::Model>> {
        let rows = Parsers::find()
            .order_by_asc(parsers::Column::Id)
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: &str) -> Result<Option<parsers::Model>> {
        Ok(Parsers::find_by_id(id.to_string()).one(&self.conn).await?)
    }

    /// Inserts the parser or refreshes its name and base URL.
    pub async fn upsert(
        &self,
        id: &str,
        name: &str,
        base_url: Option<&str>,
    ) -> Result<parsers::Model> {
        let active_model = parsers::ActiveModel {
            id: Set(id.to_string()),
            name: Set(name.to_string()),
            base_url: Set(base_url.map(ToString::to_string)),
            created_at: Set(Utc::now()),
        };

        Parsers::insert(active_model)
            .on_conflict(
                OnConflict::column(parsers::Column::Id)
                    .update_columns([parsers::Column::Name, parsers::Column::BaseUrl])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await?;

        info!("Registered parser: {}", id);

        self.get(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Parser {id} missing after upsert"))
    }
}
