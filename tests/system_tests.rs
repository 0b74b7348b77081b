//! Router-level behavior outside the resource endpoints: health, metrics,
//! the API prefix and request tracing headers.

use std::collections::HashMap;

use anilink::Settings;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use tracing::field::{Field, Visit};
use tracing::span::{Id, Record};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::{Layer, Registry};

fn settings_with(overrides: &[(&str, &str)]) -> Settings {
    let mut vars: HashMap<String, String> = [
        ("SERVER_NAME", "localhost"),
        ("PROJECT_NAME", "anilink"),
        ("FIRST_SUPERUSER_EMAIL", "admin@example.com"),
        ("POSTGRES_SCHEME", "postgres"),
        ("POSTGRES_SERVER", "localhost"),
        ("POSTGRES_USER", "anilink"),
        ("POSTGRES_PASSWORD", "secret"),
        ("POSTGRES_DB", "anilink"),
        ("GOOGLE_CLIENT_ID", "test-client"),
        ("GOOGLE_CLIENT_SECRET", "test-secret"),
        ("DATABASE_URI", "sqlite::memory:"),
        ("METRICS_ENABLED", "false"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    for (key, value) in overrides {
        vars.insert((*key).to_string(), (*value).to_string());
    }

    Settings::from_env_map(vars).expect("Failed to build test settings")
}

async fn app_with(overrides: &[(&str, &str)]) -> Router {
    let state = anilink::api::create_app_state_from_settings(settings_with(overrides), None)
        .await
        .expect("Failed to create app state");
    anilink::api::router(state)
}

async fn get(app: &Router, uri: &str) -> axum::response::Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = app_with(&[]).await;

    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(body_json["success"].as_bool().unwrap_or(false));
    assert_eq!(body_json["data"]["status"], "ok");
    assert_eq!(body_json["data"]["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_metrics_disabled() {
    let app = app_with(&[]).await;
    let response = get(&app, "/metrics").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_custom_api_prefix() {
    let app = app_with(&[("API_V1_STR", "/api/v2/")]).await;

    let response = get(&app, "/api/v2/titles/count").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(&app, "/api/v1/titles/count").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_route() {
    let app = app_with(&[]).await;
    let response = get(&app, "/api/v1/does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_path_id_is_rejected() {
    let app = app_with(&[]).await;
    let response = get(&app, "/api/v1/titles/not-a-uuid").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_settings_are_rejected() {
    let mut vars: HashMap<String, String> = HashMap::new();
    vars.insert("API_V1_STR".to_string(), "api".to_string());
    assert!(Settings::from_env_map(vars).is_err());
}

/// Collects every `user_id` recorded on spans named `request`.
#[derive(Clone, Default)]
struct RequestUserIds(Arc<Mutex<Vec<String>>>);

struct UserIdVisitor<'a>(&'a mut Option<String>);

impl Visit for UserIdVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "user_id" {
            *self.0 = Some(format!("{value:?}"));
        }
    }
}

impl<S> Layer<S> for RequestUserIds
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        if span.name() != "request" {
            return;
        }

        let mut user_id = None;
        values.record(&mut UserIdVisitor(&mut user_id));
        if let Some(user_id) = user_id {
            self.0.lock().unwrap().push(user_id);
        }
    }
}

#[tokio::test]
async fn test_user_id_is_recorded_on_request_span() {
    let captured = RequestUserIds::default();
    let _guard = tracing::subscriber::set_default(Registry::default().with(captured.clone()));

    let app = app_with(&[("ARGON2_MEMORY_COST_KIB", "1024"), ("ARGON2_TIME_COST", "1")]).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/register")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "email": "span@example.com",
                        "password": "correct horse battery",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let api_key = body_json["data"]["api_key"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/users/me")
                .header("Authorization", format!("Bearer {api_key}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let user_id = body_json["data"]["id"].as_str().unwrap().to_string();

    let recorded = captured.0.lock().unwrap().clone();
    assert_eq!(recorded, vec![user_id]);
}
