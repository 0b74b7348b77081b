use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::auth::CurrentUser;
use super::validation::{validate_message_text, validate_pagination};
use super::{ApiError, ApiResponse, AppState, DeletedDto, MessageDto, PageQuery};
use crate::db::Page;

#[derive(Deserialize)]
pub struct ListMessagesQuery {
    pub title_id: Uuid,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Deserialize)]
pub struct CreateMessageRequest {
    pub title_id: Uuid,
    pub text: String,
}

/// GET /messages?title_id=&page=
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListMessagesQuery>,
) -> Result<Json<ApiResponse<Page<MessageDto>>>, ApiError> {
    let (page, page_size) = validate_pagination(&PageQuery {
        page: query.page,
        page_size: query.page_size,
    })?;
    let messages = state
        .store()
        .messages()
        .list_by_title_id(query.title_id, page, page_size)
        .await?;

    Ok(Json(ApiResponse::success(messages.map(MessageDto::from))))
}

/// POST /messages
pub async fn create_message(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateMessageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MessageDto>>), ApiError> {
    let text = validate_message_text(&payload.text)?;

    if state
        .store()
        .titles()
        .get_title_by_id(payload.title_id)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found("Title", payload.title_id));
    }

    let message = state
        .store()
        .messages()
        .create(user.id, payload.title_id, text)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(MessageDto::from(message))),
    ))
}

/// DELETE /messages/{id}
/// Allowed for the author and superusers.
pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeletedDto>>, ApiError> {
    let message = state
        .store()
        .messages()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Message", id))?;

    if message.user_id != user.id && !user.is_superuser {
        return Err(ApiError::forbidden("Only the author can delete this message"));
    }

    let deleted = state.store().messages().delete(message.id).await?;
    Ok(Json(ApiResponse::success(DeletedDto { deleted })))
}
