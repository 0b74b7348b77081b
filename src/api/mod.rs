use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::state::SharedState;

pub mod auth;
mod episodes;
mod error;
mod files;
mod genres;
mod messages;
mod observability;
mod parsers;
mod titles;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.shared.settings
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn crate::services::AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn title_service(&self) -> &Arc<dyn crate::services::TitleService> {
        &self.shared.title_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_settings(
    settings: Settings,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(settings).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = if origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|s| s.trim_end_matches('/').parse().ok())
            .collect();
        CorsLayer::new().allow_origin(origins)
    };

    layer.allow_methods(Any).allow_headers(Any)
}

pub fn router(state: Arc<AppState>) -> Router {
    let settings = state.settings();
    let api_prefix = settings.api_v1_str.trim_end_matches('/').to_string();
    let upload_limit = settings.max_upload_bytes;
    let cors = cors_layer(&settings.backend_cors_origins);

    let api_router = Router::new()
        .merge(auth_routes())
        .merge(user_routes())
        .merge(title_routes())
        .merge(parser_routes())
        .route(
            "/files",
            post(files::upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/files/{id}",
            get(files::get_file).delete(files::delete_file),
        )
        .route("/files/{id}/content", get(files::get_file_content))
        .route(
            "/messages",
            get(messages::list_messages).post(messages::create_message),
        )
        .route(
            "/messages/{id}",
            axum::routing::delete(messages::delete_message),
        )
        .route("/genres", get(genres::list_genres))
        .route("/genres/{id}/titles", get(genres::list_genre_titles))
        .route("/episodes/{id}", get(episodes::get_episode))
        .route(
            "/episodes/{id}/progress",
            get(episodes::get_progress).put(episodes::update_progress),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        .nest(&api_prefix, api_router)
        .route("/health", get(observability::health))
        .route("/metrics", get(observability::get_metrics))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/google", post(auth::google_login))
        .route("/auth/api-key/regenerate", post(auth::regenerate_api_key))
}

fn user_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(users::list_users))
        .route("/users/me", get(users::get_me).patch(users::update_me))
        .route("/users/me/favorites", get(users::my_favorites))
        .route("/users/{id}", get(users::get_user))
}

fn title_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/titles", get(titles::list_titles))
        .route("/titles/search", get(titles::search_titles))
        .route("/titles/count", get(titles::count_titles))
        .route("/titles/lookup", post(parsers::lookup_titles))
        .route("/titles/{id}", get(titles::get_title))
        .route("/titles/{id}/related", get(titles::get_related_titles))
        .route("/titles/{id}/other-parsers", get(titles::get_other_parsers))
        .route("/titles/{id}/link", post(titles::link_title))
        .route("/titles/{id}/shikimori", put(titles::set_shikimori_id))
        .route(
            "/titles/{id}/shikimori/refresh",
            post(titles::refresh_shikimori),
        )
        .route(
            "/titles/{id}/favorite",
            post(titles::add_favorite).delete(titles::remove_favorite),
        )
        .route("/titles/{id}/episodes", get(titles::list_title_episodes))
}

fn parser_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/parsers", get(parsers::list_parsers))
        .route(
            "/parsers/{id}",
            get(parsers::get_parser).put(parsers::upsert_parser),
        )
        .route(
            "/parsers/{id}/titles",
            get(parsers::list_parser_titles).post(parsers::sync_parser_titles),
        )
        .route(
            "/parsers/{id}/titles/{website_id}/episodes",
            post(parsers::sync_title_episodes),
        )
}
