use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;

use super::observability::RequestSpan;
use super::validation::validate_email;
use super::{ApiError, ApiKeyResponse, ApiResponse, AppState, AuthResponse};
use crate::db::User;
use crate::services::Registration;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct GoogleLoginRequest {
    pub id_token: String,
}

// ============================================================================
// Middleware & extractors
// ============================================================================

/// The authenticated caller, placed in request extensions by
/// [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
    }
}

/// The caller if one authenticated, for routes open to anonymous users.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts.extensions.get::<CurrentUser>().map(|u| u.0.clone()),
        ))
    }
}

/// An authenticated superuser.
#[derive(Debug, Clone)]
pub struct SuperUser(pub User);

impl<S: Send + Sync> FromRequestParts<S> for SuperUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_superuser {
            return Err(ApiError::forbidden("Superuser privileges required"));
        }
        Ok(Self(user))
    }
}

/// Resolves the API key from:
/// 1. `X-Api-Key` header
/// 2. `Authorization: Bearer <api_key>` header
///
/// Requests without a key continue anonymously; an unknown key is rejected.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(key) = extract_api_key(request.headers()) {
        let user = state
            .auth_service()
            .verify_api_key(&key)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Invalid API key".to_string()))?;

        if let Some(RequestSpan(span)) = request.extensions().get::<RequestSpan>() {
            span.record("user_id", tracing::field::display(user.id));
        }
        request.extensions_mut().insert(CurrentUser(user));
    }

    Ok(next.run(request).await)
}

fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
    {
        return Some(key_str.trim().to_string());
    }

    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ApiError> {
    let email = validate_email(&payload.email)?.to_string();
    let name = payload
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let user = state
        .auth_service()
        .register(Registration {
            email,
            password: payload.password,
            name,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(AuthResponse::from(user))),
    ))
}

/// POST /auth/login
/// Authenticate with e-mail and password, returns the API key on success.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::validation("E-mail is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let user = state
        .auth_service()
        .login(&payload.email, &payload.password)
        .await?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(ApiResponse::success(AuthResponse::from(user))))
}

/// POST /auth/google
pub async fn google_login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GoogleLoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    if payload.id_token.trim().is_empty() {
        return Err(ApiError::validation("id_token is required"));
    }

    let user = state
        .auth_service()
        .login_with_google(payload.id_token.trim())
        .await?;

    Ok(Json(ApiResponse::success(AuthResponse::from(user))))
}

/// POST /auth/api-key/regenerate
pub async fn regenerate_api_key(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<ApiKeyResponse>>, ApiError> {
    let api_key = state.auth_service().regenerate_api_key(user.id).await?;
    Ok(Json(ApiResponse::success(ApiKeyResponse { api_key })))
}
