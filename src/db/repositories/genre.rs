use anyhow::Result;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Set, TransactionTrait,
};
use std::collections::HashSet;
use uuid::Uuid;

use super::pagination::{Page, paginate};
use super::title::search_key;
use crate::entities::{genres, prelude::*, title_genres, titles};

pub struct GenreRepository {
    conn: DatabaseConnection,
}

impl GenreRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<genres::Model>> {
        let rows = Genres::find()
            .order_by_asc(genres::Column::Name)
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<genres::Model>> {
        Ok(Genres::find_by_id(id).one(&self.conn).await?)
    }

    /// Names are matched case-insensitively.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<genres::Model>> {
        let genre = Genres::find()
            .filter(genres::Column::NameKey.eq(search_key(name)))
            .one(&self.conn)
            .await?;
        Ok(genre)
    }

    /// Returns the genres named in `names`, creating missing ones. Blank and
    /// repeated names are skipped; the first spelling of a genre is kept.
    pub async fn get_or_create_by_names(&self, names: &[String]) -> Result<Vec<genres::Model>> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();

        for name in names {
            let name = name.trim();
            let key = search_key(name);
            if key.is_empty() || !seen.insert(key.clone()) {
                continue;
            }

            if let Some(existing) = self.get_by_name(name).await? {
                result.push(existing);
                continue;
            }

            // A concurrent sync may insert the same genre first.
            Genres::insert(genres::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(name.to_string()),
                name_key: Set(key),
                created_at: Set(Utc::now()),
            })
            .on_conflict(
                OnConflict::column(genres::Column::NameKey)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

            let genre = self
                .get_by_name(name)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Genre {name} missing after insert"))?;
            result.push(genre);
        }

        Ok(result)
    }

    /// Replaces the genre set of a title.
    pub async fn set_title_genres(&self, title_id: Uuid, genre_ids: &[Uuid]) -> Result<()> {
        let txn = self.conn.begin().await?;

        TitleGenres::delete_many()
            .filter(title_genres::Column::TitleId.eq(title_id))
            .exec(&txn)
            .await?;

        let mut seen = HashSet::new();
        let rows: Vec<title_genres::ActiveModel> = genre_ids
            .iter()
            .filter(|id| seen.insert(**id))
            .map(|genre_id| title_genres::ActiveModel {
                title_id: Set(title_id),
                genre_id: Set(*genre_id),
            })
            .collect();

        if !rows.is_empty() {
            TitleGenres::insert_many(rows).exec(&txn).await?;
        }

        txn.commit().await?;
        Ok(())
    }

    pub async fn get_genres_by_title_id(&self, title_id: Uuid) -> Result<Vec<genres::Model>> {
        let rows = Genres::find()
            .join(JoinType::InnerJoin, genres::Relation::TitleGenres.def())
            .filter(title_genres::Column::TitleId.eq(title_id))
            .order_by_asc(genres::Column::Name)
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn get_titles_by_genre_id(
        &self,
        genre_id: Uuid,
        page: u64,
        page_size: u64,
    ) -> Result<Page<titles::Model>> {
        let query = Titles::find()
            .join(JoinType::InnerJoin, titles::Relation::TitleGenres.def())
            .filter(title_genres::Column::GenreId.eq(genre_id))
            .order_by_desc(titles::Column::CreatedAt);

        paginate(&self.conn, query, page, page_size).await
    }
}
