//! Domain service for titles, their cross-parser links and Shikimori
//! reconciliation.

use crate::entities::{episodes, genres, titles};
use crate::models::episode::ParsedEpisode;
use crate::models::title::{LinkParsedTitle, ParsedTitle};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TitleError {
    #[error("Title not found: {0}")]
    NotFound(String),

    #[error("Parser not found: {0}")]
    ParserNotFound(String),

    #[error("Invalid title data: {0}")]
    InvalidData(String),

    #[error("External API error: {service} - {message}")]
    ExternalApi { service: String, message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TitleError {
    pub fn shikimori_error(msg: impl Into<String>) -> Self {
        Self::ExternalApi {
            service: "Shikimori".to_string(),
            message: msg.into(),
        }
    }
}

impl From<sea_orm::DbErr> for TitleError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for TitleError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Outcome of a parser sync.
#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    pub created: usize,
    pub updated: usize,
    pub titles: Vec<titles::Model>,
}

/// A title with everything a detail page shows.
#[derive(Debug, Clone)]
pub struct TitleDetails {
    pub title: titles::Model,
    pub genres: Vec<genres::Model>,
    pub related: Vec<titles::Model>,
    pub other_parsers: Vec<titles::Model>,
    pub is_favorite: bool,
}

#[async_trait::async_trait]
pub trait TitleService: Send + Sync {
    /// Upserts titles reported by a parser, keyed by `(parser_id, id_on_website)`,
    /// and replaces their genre sets.
    ///
    /// # Errors
    ///
    /// Returns [`TitleError::ParserNotFound`] if the parser is not registered.
    async fn sync_parser_titles(
        &self,
        parser_id: &str,
        parsed: Vec<ParsedTitle>,
    ) -> Result<SyncSummary, TitleError>;

    /// Groups `title_id` with the referenced title of another parser. The
    /// referenced title is created when unknown. Returns the titles now related
    /// to `title_id`.
    async fn link_titles(
        &self,
        title_id: Uuid,
        link: LinkParsedTitle,
    ) -> Result<Vec<titles::Model>, TitleError>;

    async fn set_shikimori_id(
        &self,
        title_id: Uuid,
        shikimori_id: i64,
    ) -> Result<titles::Model, TitleError>;

    /// Looks the title up on Shikimori unless a previous lookup is still
    /// fresh. `force` ignores freshness.
    async fn refresh_shikimori(
        &self,
        title_id: Uuid,
        force: bool,
    ) -> Result<titles::Model, TitleError>;

    async fn title_details(
        &self,
        title_id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<TitleDetails, TitleError>;

    /// Upserts the episodes of a title, keyed by their website id, and
    /// returns the full episode list.
    async fn sync_episodes(
        &self,
        parser_id: &str,
        website_id: &str,
        parsed: Vec<ParsedEpisode>,
    ) -> Result<Vec<episodes::Model>, TitleError>;
}
