use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::auth::{CurrentUser, SuperUser};
use super::validation::validate_pagination;
use super::{ApiError, ApiResponse, AppState, PageQuery, PublicUserDto, TitleDto, UserDto};
use crate::db::Page;

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// GET /users/me
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<ApiResponse<UserDto>> {
    Json(ApiResponse::success(user.into()))
}

/// PATCH /users/me
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    if payload.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::validation("Name cannot be empty"));
    }
    if let Some(url) = payload.avatar_url.as_deref()
        && url::Url::parse(url).is_err()
    {
        return Err(ApiError::validation(format!("Invalid avatar URL: {url}")));
    }

    let updated = state
        .store()
        .users()
        .update_profile(
            user.id,
            payload.name.map(|n| n.trim().to_string()),
            payload.avatar_url,
        )
        .await?
        .ok_or_else(|| ApiError::not_found("User", user.id))?;

    Ok(Json(ApiResponse::success(updated.into())))
}

/// GET /users/me/favorites
pub async fn my_favorites(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Page<TitleDto>>>, ApiError> {
    let (page, page_size) = validate_pagination(&query)?;
    let favorites = state
        .store()
        .titles()
        .get_favorite_titles_by_user_id(user.id, page, page_size)
        .await?;

    Ok(Json(ApiResponse::success(favorites.map(TitleDto::from))))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PublicUserDto>>, ApiError> {
    let user = state
        .store()
        .users()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    Ok(Json(ApiResponse::success(user.into())))
}

/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    SuperUser(_admin): SuperUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Page<UserDto>>>, ApiError> {
    let (page, page_size) = validate_pagination(&query)?;
    let users = state.store().users().list(page, page_size).await?;
    Ok(Json(ApiResponse::success(users.map(UserDto::from))))
}
