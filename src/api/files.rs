use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, DeletedDto, FileDto};
use crate::db::repositories::file::NewFile;
use crate::entities::files;

const FILE_FIELD: &str = "file";

/// Keeps only the last path component of a client supplied file name.
fn sanitize_filename(raw: &str) -> Option<String> {
    let name = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

fn storage_path(state: &AppState, storage_key: &str) -> PathBuf {
    PathBuf::from(&state.settings().files_path).join(storage_key)
}

/// Oversized bodies surface from the multipart stream once the body limit trips.
fn multipart_error(context: &str, err: &MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(format!("{context}: {}", err.body_text()))
    } else {
        ApiError::validation(format!("{context}: {}", err.body_text()))
    }
}

async fn require_file(state: &AppState, id: Uuid) -> Result<files::Model, ApiError> {
    state
        .store()
        .files()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("File", id))
}

/// POST /files
/// Multipart upload, the payload is read from the `file` field.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<FileDto>>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Invalid multipart body", &e))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .and_then(sanitize_filename)
            .ok_or_else(|| ApiError::validation("Uploaded file needs a file name"))?;

        let content_type = field.content_type().map_or_else(
            || {
                mime_guess::from_path(&filename)
                    .first_or_octet_stream()
                    .to_string()
            },
            ToString::to_string,
        );

        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error("Failed to read upload", &e))?;

        let id = Uuid::new_v4();
        let storage_key = id.to_string();
        let path = storage_path(&state, &storage_key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ApiError::internal(format!("Failed to create files dir: {e}")))?;
        }
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to store file: {e}")))?;

        let size = i64::try_from(data.len()).unwrap_or(i64::MAX);
        let model = state
            .store()
            .files()
            .create(NewFile {
                id,
                user_id: user.id,
                filename,
                content_type,
                size,
                storage_key,
            })
            .await?;

        info!(file_id = %model.id, size = model.size, "Stored upload {}", model.filename);

        return Ok((
            StatusCode::CREATED,
            Json(ApiResponse::success(FileDto::from(model))),
        ));
    }

    Err(ApiError::validation(format!(
        "Multipart body has no '{FILE_FIELD}' field"
    )))
}

/// GET /files/{id}
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FileDto>>, ApiError> {
    let file = require_file(&state, id).await?;
    Ok(Json(ApiResponse::success(file.into())))
}

/// GET /files/{id}/content
pub async fn get_file_content(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let file = require_file(&state, id).await?;
    let path = storage_path(&state, &file.storage_key);

    let data = match tokio::fs::read(&path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(file_id = %file.id, "Stored file is missing on disk");
            return Err(ApiError::not_found("File content", id));
        }
        Err(e) => return Err(ApiError::internal(format!("Failed to read file: {e}"))),
    };

    let disposition = format!(
        "inline; filename=\"{}\"",
        file.filename.replace(['"', '\\'], "_")
    );

    Ok((
        [
            (header::CONTENT_TYPE, file.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(data),
    )
        .into_response())
}

/// DELETE /files/{id}
/// Allowed for the uploader and superusers.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeletedDto>>, ApiError> {
    let file = require_file(&state, id).await?;

    if file.user_id != user.id && !user.is_superuser {
        return Err(ApiError::forbidden("Only the uploader can delete this file"));
    }

    let deleted = state.store().files().delete(file.id).await?;

    let path = storage_path(&state, &file.storage_key);
    if let Err(e) = tokio::fs::remove_file(&path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(file_id = %file.id, error = %e, "Failed to remove stored file");
    }

    Ok(Json(ApiResponse::success(DeletedDto { deleted })))
}
