use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::auth::CurrentUser;
use super::validation::validate_progress_seconds;
use super::{ApiError, ApiResponse, AppState, EpisodeDto, ProgressDto};
use crate::entities::episodes;
use crate::models::episode::ProgressUpdate;

#[derive(Deserialize)]
pub struct ProgressRequest {
    pub seconds: f64,
    #[serde(default)]
    pub completed: bool,
}

async fn require_episode(state: &AppState, id: Uuid) -> Result<episodes::Model, ApiError> {
    state
        .store()
        .episodes()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Episode", id))
}

/// GET /episodes/{id}
pub async fn get_episode(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<EpisodeDto>>, ApiError> {
    let episode = require_episode(&state, id).await?;
    Ok(Json(ApiResponse::success(episode.into())))
}

/// GET /episodes/{id}/progress
/// Episodes the user never started report zero progress.
pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ProgressDto>>, ApiError> {
    let episode = require_episode(&state, id).await?;

    let progress = state
        .store()
        .episodes()
        .get_progress(user.id, episode.id)
        .await?
        .map_or_else(|| ProgressDto::empty(episode.id), ProgressDto::from);

    Ok(Json(ApiResponse::success(progress)))
}

/// PUT /episodes/{id}/progress
pub async fn update_progress(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProgressRequest>,
) -> Result<Json<ApiResponse<ProgressDto>>, ApiError> {
    let seconds = validate_progress_seconds(payload.seconds)?;
    let episode = require_episode(&state, id).await?;

    let progress = state
        .store()
        .episodes()
        .upsert_progress(
            user.id,
            episode.id,
            ProgressUpdate {
                seconds,
                completed: payload.completed,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(progress.into())))
}
