use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::SuperUser;
use super::validation::{validate_pagination, validate_parser_id};
use super::{
    ApiError, ApiResponse, AppState, EpisodeDto, PageQuery, ParserDto, SyncResultDto, TitleDto,
};
use crate::db::Page;
use crate::models::episode::ParsedEpisode;
use crate::models::title::ParsedTitle;

const MAX_LOOKUP_IDS: usize = 500;

#[derive(Deserialize)]
pub struct UpsertParserRequest {
    pub name: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Deserialize)]
pub struct SyncTitlesRequest {
    pub titles: Vec<ParsedTitle>,
}

#[derive(Deserialize)]
pub struct SyncEpisodesRequest {
    pub episodes: Vec<ParsedEpisode>,
}

#[derive(Deserialize)]
pub struct LookupRequest {
    pub website_ids: Vec<String>,
    #[serde(default)]
    pub parser_id: Option<String>,
}

/// GET /parsers
pub async fn list_parsers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<ParserDto>>>, ApiError> {
    let parsers = state.store().parsers().list().await?;
    Ok(Json(ApiResponse::success(
        parsers.into_iter().map(ParserDto::from).collect(),
    )))
}

/// GET /parsers/{id}
pub async fn get_parser(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ParserDto>>, ApiError> {
    let parser = state
        .store()
        .parsers()
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Parser", &id))?;

    Ok(Json(ApiResponse::success(parser.into())))
}

/// PUT /parsers/{id}
/// Registers a parser or updates its name and base URL.
pub async fn upsert_parser(
    State(state): State<Arc<AppState>>,
    SuperUser(_admin): SuperUser,
    Path(id): Path<String>,
    Json(payload): Json<UpsertParserRequest>,
) -> Result<Json<ApiResponse<ParserDto>>, ApiError> {
    let id = validate_parser_id(&id)?;
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("Parser name cannot be empty"));
    }
    if let Some(base_url) = payload.base_url.as_deref()
        && url::Url::parse(base_url).is_err()
    {
        return Err(ApiError::validation(format!("Invalid base URL: {base_url}")));
    }

    let parser = state
        .store()
        .parsers()
        .upsert(id, name, payload.base_url.as_deref())
        .await?;

    Ok(Json(ApiResponse::success(parser.into())))
}

/// GET /parsers/{id}/titles
pub async fn list_parser_titles(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Page<TitleDto>>>, ApiError> {
    let (page, page_size) = validate_pagination(&query)?;

    if state.store().parsers().get(&id).await?.is_none() {
        return Err(ApiError::not_found("Parser", &id));
    }

    let titles = state
        .store()
        .titles()
        .list_titles_by_parser(&id, page, page_size)
        .await?;

    Ok(Json(ApiResponse::success(titles.map(TitleDto::from))))
}

/// POST /parsers/{id}/titles
/// Bulk upsert of the titles a parser scraped.
pub async fn sync_parser_titles(
    State(state): State<Arc<AppState>>,
    SuperUser(_admin): SuperUser,
    Path(id): Path<String>,
    Json(payload): Json<SyncTitlesRequest>,
) -> Result<Json<ApiResponse<SyncResultDto>>, ApiError> {
    let summary = state
        .title_service()
        .sync_parser_titles(&id, payload.titles)
        .await?;

    Ok(Json(ApiResponse::success(SyncResultDto {
        created: summary.created,
        updated: summary.updated,
        titles: summary.titles.into_iter().map(TitleDto::from).collect(),
    })))
}

/// POST /parsers/{id}/titles/{website_id}/episodes
pub async fn sync_title_episodes(
    State(state): State<Arc<AppState>>,
    SuperUser(_admin): SuperUser,
    Path((id, website_id)): Path<(String, String)>,
    Json(payload): Json<SyncEpisodesRequest>,
) -> Result<Json<ApiResponse<Vec<EpisodeDto>>>, ApiError> {
    let episodes = state
        .title_service()
        .sync_episodes(&id, &website_id, payload.episodes)
        .await?;

    Ok(Json(ApiResponse::success(
        episodes.into_iter().map(EpisodeDto::from).collect(),
    )))
}

/// POST /titles/lookup
/// Resolves website ids to stored titles, optionally restricted to a parser.
pub async fn lookup_titles(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LookupRequest>,
) -> Result<Json<ApiResponse<Vec<TitleDto>>>, ApiError> {
    if payload.website_ids.len() > MAX_LOOKUP_IDS {
        return Err(ApiError::validation(format!(
            "At most {MAX_LOOKUP_IDS} ids can be looked up at once"
        )));
    }

    let titles = state
        .store()
        .titles()
        .get_titles_by_website_ids(&payload.website_ids)
        .await?;

    let titles = titles
        .into_iter()
        .filter(|t| {
            payload
                .parser_id
                .as_deref()
                .is_none_or(|parser_id| t.parser_id == parser_id)
        })
        .map(TitleDto::from)
        .collect();

    Ok(Json(ApiResponse::success(titles)))
}
