use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;
use uuid::Uuid;

use super::validation::validate_pagination;
use super::{ApiError, ApiResponse, AppState, GenreDto, PageQuery, TitleDto};
use crate::db::Page;

/// GET /genres
pub async fn list_genres(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<GenreDto>>>, ApiError> {
    let genres = state.store().genres().list().await?;
    Ok(Json(ApiResponse::success(
        genres.into_iter().map(GenreDto::from).collect(),
    )))
}

/// GET /genres/{id}/titles
pub async fn list_genre_titles(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Page<TitleDto>>>, ApiError> {
    let (page, page_size) = validate_pagination(&query)?;

    if state.store().genres().get_by_id(id).await?.is_none() {
        return Err(ApiError::not_found("Genre", id));
    }

    let titles = state
        .store()
        .genres()
        .get_titles_by_genre_id(id, page, page_size)
        .await?;

    Ok(Json(ApiResponse::success(titles.map(TitleDto::from))))
}
