use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::auth::{CurrentUser, MaybeUser, SuperUser};
use super::validation::{validate_page_size, validate_pagination, validate_search_query};
use super::{
    ApiError, ApiResponse, AppState, CountDto, EpisodeDto, FavoriteDto, PageQuery,
    TitleDetailsDto, TitleDto,
};
use crate::db::{DEFAULT_PAGE_SIZE, Page};
use crate::entities::titles;
use crate::models::title::LinkParsedTitle;

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub page_size: Option<u64>,
}

#[derive(Deserialize)]
pub struct ShikimoriIdRequest {
    pub shikimori_id: i64,
}

#[derive(Deserialize, Default)]
pub struct RefreshQuery {
    #[serde(default)]
    pub force: bool,
}

async fn require_title(state: &AppState, id: Uuid) -> Result<titles::Model, ApiError> {
    state
        .store()
        .titles()
        .get_title_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Title", id))
}

/// GET /titles
pub async fn list_titles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Page<TitleDto>>>, ApiError> {
    let (page, page_size) = validate_pagination(&query)?;
    let titles = state.store().titles().list_titles(page, page_size).await?;
    Ok(Json(ApiResponse::success(titles.map(TitleDto::from))))
}

/// GET /titles/search?q=
pub async fn search_titles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<TitleDto>>>, ApiError> {
    let q = validate_search_query(&query.q)?;
    let page_size = validate_page_size(query.page_size.unwrap_or(DEFAULT_PAGE_SIZE))?;

    let titles = state.store().titles().search_titles(q, page_size).await?;
    Ok(Json(ApiResponse::success(
        titles.into_iter().map(TitleDto::from).collect(),
    )))
}

/// GET /titles/count
pub async fn count_titles(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<CountDto>>, ApiError> {
    let count = state.store().titles().get_titles_count().await?;
    Ok(Json(ApiResponse::success(CountDto { count })))
}

/// GET /titles/{id}
pub async fn get_title(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TitleDetailsDto>>, ApiError> {
    let details = state
        .title_service()
        .title_details(id, user.map(|u| u.id))
        .await?;

    Ok(Json(ApiResponse::success(details.into())))
}

/// GET /titles/{id}/related
pub async fn get_related_titles(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<TitleDto>>>, ApiError> {
    let title = require_title(&state, id).await?;
    let related = state
        .store()
        .titles()
        .get_related_titles_by_title_id(title.id)
        .await?;

    Ok(Json(ApiResponse::success(
        related.into_iter().map(TitleDto::from).collect(),
    )))
}

/// GET /titles/{id}/other-parsers
pub async fn get_other_parsers(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<TitleDto>>>, ApiError> {
    let title = require_title(&state, id).await?;
    let others = state
        .store()
        .titles()
        .get_title_on_other_parsers(&title)
        .await?;

    Ok(Json(ApiResponse::success(
        others.into_iter().map(TitleDto::from).collect(),
    )))
}

/// POST /titles/{id}/link
pub async fn link_title(
    State(state): State<Arc<AppState>>,
    SuperUser(_admin): SuperUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<LinkParsedTitle>,
) -> Result<Json<ApiResponse<Vec<TitleDto>>>, ApiError> {
    if payload.id_on_website.trim().is_empty() || payload.name.trim().is_empty() {
        return Err(ApiError::validation(
            "Linked title needs a website id and a name",
        ));
    }

    let related = state.title_service().link_titles(id, payload).await?;

    Ok(Json(ApiResponse::success(
        related.into_iter().map(TitleDto::from).collect(),
    )))
}

/// PUT /titles/{id}/shikimori
pub async fn set_shikimori_id(
    State(state): State<Arc<AppState>>,
    SuperUser(_admin): SuperUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ShikimoriIdRequest>,
) -> Result<Json<ApiResponse<TitleDto>>, ApiError> {
    let title = state
        .title_service()
        .set_shikimori_id(id, payload.shikimori_id)
        .await?;

    Ok(Json(ApiResponse::success(title.into())))
}

/// POST /titles/{id}/shikimori/refresh?force=
pub async fn refresh_shikimori(
    State(state): State<Arc<AppState>>,
    SuperUser(_admin): SuperUser,
    Path(id): Path<Uuid>,
    Query(query): Query<RefreshQuery>,
) -> Result<Json<ApiResponse<TitleDto>>, ApiError> {
    let title = state
        .title_service()
        .refresh_shikimori(id, query.force)
        .await?;

    Ok(Json(ApiResponse::success(title.into())))
}

/// POST /titles/{id}/favorite
/// Adding an existing favourite is a no-op.
pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FavoriteDto>>, ApiError> {
    let title = require_title(&state, id).await?;
    state
        .store()
        .titles()
        .create_favorite_title(title.id, user.id)
        .await?;

    Ok(Json(ApiResponse::success(FavoriteDto {
        title_id: title.id,
        is_favorite: true,
    })))
}

/// DELETE /titles/{id}/favorite
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FavoriteDto>>, ApiError> {
    let title = require_title(&state, id).await?;
    state
        .store()
        .titles()
        .delete_favorite_title(title.id, user.id)
        .await?;

    Ok(Json(ApiResponse::success(FavoriteDto {
        title_id: title.id,
        is_favorite: false,
    })))
}

/// GET /titles/{id}/episodes
pub async fn list_title_episodes(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<EpisodeDto>>>, ApiError> {
    let title = require_title(&state, id).await?;
    let episodes = state.store().episodes().list_by_title_id(title.id).await?;

    Ok(Json(ApiResponse::success(
        episodes.into_iter().map(EpisodeDto::from).collect(),
    )))
}
