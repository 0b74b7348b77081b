use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::sea_query::{Expr, LikeExpr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use tracing::{debug, info};
use uuid::Uuid;

use super::pagination::{Page, paginate};
use crate::entities::{favorite_titles, prelude::*, related_links, related_titles, titles};
use crate::models::title::{NewTitle, ParsedTitle};

/// Lowercased form stored next to each name. Folding happens here rather
/// than in SQL because `SQLite`'s `lower()` only handles ASCII.
#[must_use]
pub fn search_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Escapes LIKE wildcards so user input only matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub struct TitleRepository {
    conn: DatabaseConnection,
}

impl TitleRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_titles_by_website_ids(
        &self,
        website_ids: &[String],
    ) -> Result<Vec<titles::Model>> {
        if website_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = Titles::find()
            .filter(titles::Column::IdOnWebsite.is_in(website_ids.iter().cloned()))
            .all(&self.conn)
            .await?;

        Ok(rows)
    }

    /// Case-insensitive substring search on both names, newest first.
    pub async fn search_titles(&self, query: &str, page_size: u64) -> Result<Vec<titles::Model>> {
        let pattern = format!("%{}%", escape_like(&search_key(query)));

        let name_matches = Expr::col((titles::Entity, titles::Column::NameSearch))
            .like(LikeExpr::new(pattern.clone()).escape('\\'));
        let en_name_matches = Expr::col((titles::Entity, titles::Column::EnNameSearch))
            .like(LikeExpr::new(pattern).escape('\\'));

        let rows = Titles::find()
            .filter(Condition::any().add(name_matches).add(en_name_matches))
            .order_by_desc(titles::Column::CreatedAt)
            .limit(page_size)
            .all(&self.conn)
            .await?;

        Ok(rows)
    }

    pub async fn get_titles_count(&self) -> Result<u64> {
        Ok(Titles::find().count(&self.conn).await?)
    }

    pub async fn list_titles(&self, page: u64, page_size: u64) -> Result<Page<titles::Model>> {
        let query = Titles::find().order_by_desc(titles::Column::CreatedAt);
        paginate(&self.conn, query, page, page_size).await
    }

    pub async fn list_titles_by_parser(
        &self,
        parser_id: &str,
        page: u64,
        page_size: u64,
    ) -> Result<Page<titles::Model>> {
        let query = Titles::find()
            .filter(titles::Column::ParserId.eq(parser_id))
            .order_by_desc(titles::Column::CreatedAt);
        paginate(&self.conn, query, page, page_size).await
    }

    /// Other titles grouped with `title_id` under the same related link.
    pub async fn get_related_titles_by_title_id(
        &self,
        title_id: Uuid,
    ) -> Result<Vec<titles::Model>> {
        let Some(link) = self.get_related_link_by_title_id(title_id).await? else {
            return Ok(Vec::new());
        };

        let rows = Titles::find()
            .join(JoinType::InnerJoin, titles::Relation::RelatedTitles.def())
            .filter(related_titles::Column::LinkId.eq(link.id))
            .filter(titles::Column::Id.ne(title_id))
            .order_by_asc(titles::Column::ParserId)
            .all(&self.conn)
            .await?;

        Ok(rows)
    }

    pub async fn create_title(&self, title: NewTitle, parser_id: &str) -> Result<titles::Model> {
        let now = Utc::now();
        let active_model = titles::ActiveModel {
            id: Set(Uuid::new_v4()),
            id_on_website: Set(title.id_on_website),
            parser_id: Set(parser_id.to_string()),
            name_search: Set(search_key(&title.name)),
            en_name_search: Set(title.en_name.as_deref().map(search_key)),
            name: Set(title.name),
            en_name: Set(title.en_name),
            image_url: Set(title.image_url),
            shikimori_id: Set(None),
            shikimori_fetched: Set(false),
            shikimori_fetched_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model
            .insert(&self.conn)
            .await
            .context("Failed to insert title")?;

        debug!(title_id = %model.id, parser_id, "Created title {}", model.name);
        Ok(model)
    }

    pub async fn get_related_link_by_title_id(
        &self,
        title_id: Uuid,
    ) -> Result<Option<related_links::Model>> {
        let link = RelatedLinks::find()
            .join(
                JoinType::InnerJoin,
                related_links::Relation::RelatedTitles.def(),
            )
            .filter(related_titles::Column::TitleId.eq(title_id))
            .one(&self.conn)
            .await?;

        Ok(link)
    }

    pub async fn get_related_title(
        &self,
        title_id: Uuid,
        link_id: Uuid,
    ) -> Result<Option<related_titles::Model>> {
        let row = RelatedTitles::find()
            .filter(related_titles::Column::TitleId.eq(title_id))
            .filter(related_titles::Column::LinkId.eq(link_id))
            .one(&self.conn)
            .await?;

        Ok(row)
    }

    pub async fn create_related_link(&self) -> Result<related_links::Model> {
        let active_model = related_links::ActiveModel {
            id: Set(Uuid::new_v4()),
            created_at: Set(Utc::now()),
        };

        Ok(active_model.insert(&self.conn).await?)
    }

    pub async fn create_related_title(
        &self,
        title_id: Uuid,
        link_id: Uuid,
    ) -> Result<related_titles::Model> {
        let active_model = related_titles::ActiveModel {
            id: Set(Uuid::new_v4()),
            link_id: Set(link_id),
            title_id: Set(title_id),
        };

        Ok(active_model.insert(&self.conn).await?)
    }

    /// Moves every title of `absorb` into `keep` and drops `absorb`.
    pub async fn merge_related_links(&self, keep: Uuid, absorb: Uuid) -> Result<()> {
        if keep == absorb {
            return Ok(());
        }

        let txn = self.conn.begin().await?;

        let kept_title_ids: Vec<Uuid> = RelatedTitles::find()
            .filter(related_titles::Column::LinkId.eq(keep))
            .all(&txn)
            .await?
            .into_iter()
            .map(|row| row.title_id)
            .collect();

        if !kept_title_ids.is_empty() {
            RelatedTitles::delete_many()
                .filter(related_titles::Column::LinkId.eq(absorb))
                .filter(related_titles::Column::TitleId.is_in(kept_title_ids))
                .exec(&txn)
                .await?;
        }

        RelatedTitles::update_many()
            .col_expr(related_titles::Column::LinkId, Expr::value(keep))
            .filter(related_titles::Column::LinkId.eq(absorb))
            .exec(&txn)
            .await?;

        RelatedLinks::delete_by_id(absorb).exec(&txn).await?;

        txn.commit().await?;

        info!("Merged related link {} into {}", absorb, keep);
        Ok(())
    }

    pub async fn get_title_by_website_id(
        &self,
        website_id: &str,
        parser_id: &str,
    ) -> Result<Option<titles::Model>> {
        let title = Titles::find()
            .filter(titles::Column::IdOnWebsite.eq(website_id))
            .filter(titles::Column::ParserId.eq(parser_id))
            .one(&self.conn)
            .await?;

        Ok(title)
    }

    /// Refreshes name and image; the English name is only replaced when the
    /// parser reports one.
    pub async fn update_title(
        &self,
        db_title: titles::Model,
        title: &ParsedTitle,
    ) -> Result<titles::Model> {
        let en_name = title
            .en_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(ToString::to_string);

        let mut active: titles::ActiveModel = db_title.into();
        active.name = Set(title.name.clone());
        active.name_search = Set(search_key(&title.name));
        active.image_url = Set(title.image_url.clone());
        if let Some(en_name) = en_name {
            active.en_name_search = Set(Some(search_key(&en_name)));
            active.en_name = Set(Some(en_name));
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&self.conn).await?)
    }

    pub async fn update_shikimori_info(
        &self,
        db_title: titles::Model,
        shikimori_id: i64,
    ) -> Result<titles::Model> {
        let now = Utc::now();

        let mut active: titles::ActiveModel = db_title.into();
        active.shikimori_id = Set(Some(shikimori_id));
        active.shikimori_fetched = Set(true);
        active.shikimori_fetched_at = Set(Some(now));
        active.updated_at = Set(now);

        Ok(active.update(&self.conn).await?)
    }

    /// Records a Shikimori lookup that found nothing, so it is not retried
    /// before the expiration window passes.
    pub async fn mark_shikimori_fetched(&self, db_title: titles::Model) -> Result<titles::Model> {
        let now = Utc::now();

        let mut active: titles::ActiveModel = db_title.into();
        active.shikimori_fetched = Set(true);
        active.shikimori_fetched_at = Set(Some(now));
        active.updated_at = Set(now);

        Ok(active.update(&self.conn).await?)
    }

    pub async fn get_title_by_id(&self, title_id: Uuid) -> Result<Option<titles::Model>> {
        Ok(Titles::find_by_id(title_id).one(&self.conn).await?)
    }

    /// Same anime (by Shikimori id) under other parsers.
    pub async fn get_title_on_other_parsers(
        &self,
        title: &titles::Model,
    ) -> Result<Vec<titles::Model>> {
        let Some(shikimori_id) = title.shikimori_id else {
            return Ok(Vec::new());
        };

        let rows = Titles::find()
            .filter(titles::Column::ShikimoriId.eq(shikimori_id))
            .filter(titles::Column::ParserId.ne(title.parser_id.as_str()))
            .filter(titles::Column::Id.ne(title.id))
            .order_by_asc(titles::Column::ParserId)
            .all(&self.conn)
            .await?;

        Ok(rows)
    }

    pub async fn get_favorite_title(
        &self,
        title_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<favorite_titles::Model>> {
        let row = FavoriteTitles::find()
            .filter(favorite_titles::Column::TitleId.eq(title_id))
            .filter(favorite_titles::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await?;

        Ok(row)
    }

    pub async fn title_is_favorite(&self, title_id: Uuid, user_id: Uuid) -> Result<bool> {
        Ok(self.get_favorite_title(title_id, user_id).await?.is_some())
    }

    pub async fn get_favorite_titles_by_user_id(
        &self,
        user_id: Uuid,
        page: u64,
        page_size: u64,
    ) -> Result<Page<titles::Model>> {
        let query = Titles::find()
            .join(JoinType::InnerJoin, titles::Relation::FavoriteTitles.def())
            .filter(favorite_titles::Column::UserId.eq(user_id))
            .order_by_desc(titles::Column::CreatedAt);

        paginate(&self.conn, query, page, page_size).await
    }

    /// Bookmarks a title. Returns `false` when it already was a favourite.
    pub async fn create_favorite_title(&self, title_id: Uuid, user_id: Uuid) -> Result<bool> {
        let active_model = favorite_titles::ActiveModel {
            user_id: Set(user_id),
            title_id: Set(title_id),
            created_at: Set(Utc::now()),
        };

        let inserted = FavoriteTitles::insert(active_model)
            .on_conflict(
                OnConflict::columns([
                    favorite_titles::Column::UserId,
                    favorite_titles::Column::TitleId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        Ok(inserted > 0)
    }

    pub async fn delete_favorite_title(&self, title_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = FavoriteTitles::delete_many()
            .filter(favorite_titles::Column::TitleId.eq(title_id))
            .filter(favorite_titles::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }
}
