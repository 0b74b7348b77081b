//! Integration tests for the HTTP API.
//!
//! Every test builds the full router against a fresh SQLite database and
//! drives it with `oneshot` requests.

use std::collections::HashMap;

use anilink::Settings;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

const ADMIN_EMAIL: &str = "admin@example.com";
const PASSWORD: &str = "correct horse battery";

fn test_settings(overrides: &[(&str, &str)]) -> Settings {
    let id = uuid::Uuid::new_v4();
    let db_path = std::env::temp_dir().join(format!("anilink-api-test-{id}.db"));
    let files_path = std::env::temp_dir().join(format!("anilink-api-files-{id}"));

    let mut vars: HashMap<String, String> = [
        ("SERVER_NAME", "localhost"),
        ("PROJECT_NAME", "anilink"),
        ("FIRST_SUPERUSER_EMAIL", ADMIN_EMAIL),
        ("POSTGRES_SCHEME", "postgres"),
        ("POSTGRES_SERVER", "localhost"),
        ("POSTGRES_USER", "anilink"),
        ("POSTGRES_PASSWORD", "secret"),
        ("POSTGRES_DB", "anilink"),
        ("GOOGLE_CLIENT_ID", "test-client"),
        ("GOOGLE_CLIENT_SECRET", "test-secret"),
        ("ARGON2_MEMORY_COST_KIB", "1024"),
        ("ARGON2_TIME_COST", "1"),
        ("METRICS_ENABLED", "false"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    vars.insert(
        "DATABASE_URI".to_string(),
        format!("sqlite:{}", db_path.display()),
    );
    vars.insert("FILES_PATH".to_string(), files_path.display().to_string());

    for (key, value) in overrides {
        vars.insert((*key).to_string(), (*value).to_string());
    }

    Settings::from_env_map(vars).expect("Failed to build test settings")
}

async fn spawn_app_with(overrides: &[(&str, &str)]) -> Router {
    let state = anilink::api::create_app_state_from_settings(test_settings(overrides), None)
        .await
        .expect("Failed to create app state");
    anilink::api::router(state)
}

async fn spawn_app() -> Router {
    spawn_app_with(&[]).await
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    api_key: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = api_key {
        builder = builder.header("Authorization", format!("Bearer {key}"));
    }

    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, json)
}

async fn register(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({ "email": email, "password": PASSWORD, "name": "Tester" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body["data"]["api_key"].as_str().unwrap().to_string()
}

async fn create_parser(app: &Router, admin_key: &str, id: &str) {
    let (status, _) = send(
        app,
        "PUT",
        &format!("/api/v1/parsers/{id}"),
        Some(admin_key),
        Some(json!({ "name": id.to_uppercase(), "base_url": format!("https://{id}.example") })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

async fn sync_titles(app: &Router, admin_key: &str, parser: &str, titles: Value) -> Value {
    let (status, body) = send(
        app,
        "POST",
        &format!("/api/v1/parsers/{parser}/titles"),
        Some(admin_key),
        Some(json!({ "titles": titles })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "sync failed: {body}");
    body["data"].clone()
}

fn ids(list: &Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_register_login_and_api_keys() {
    let app = spawn_app().await;

    let api_key = register(&app, "user@example.com").await;
    assert_eq!(api_key.len(), 64);

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "USER@example.com", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["api_key"], api_key.as_str());
    assert_eq!(body["data"]["user"]["is_superuser"], false);

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "user@example.com", "password": "wrong password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({ "email": "user@example.com", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({ "email": "short@example.com", "password": "short" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({ "email": "not-an-email", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Regenerating invalidates the previous key.
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/auth/api-key/regenerate",
        Some(&api_key),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let new_key = body["data"]["api_key"].as_str().unwrap().to_string();
    assert_ne!(new_key, api_key);

    let (status, _) = send(&app, "GET", "/api/v1/users/me", Some(&api_key), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "GET", "/api/v1/users/me", Some(&new_key), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "user@example.com");
}

#[tokio::test]
async fn test_authentication_is_enforced() {
    let app = spawn_app().await;

    let (status, _) = send(&app, "GET", "/api/v1/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // An unknown key is rejected even on public routes.
    let (status, _) = send(&app, "GET", "/api/v1/titles", Some("not-a-key"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "GET", "/api/v1/titles", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 0);

    // X-Api-Key works as well as the bearer header.
    let api_key = register(&app, "header@example.com").await;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/users/me")
                .header("X-Api-Key", api_key)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_first_superuser_and_admin_routes() {
    let app = spawn_app().await;

    let admin_key = register(&app, ADMIN_EMAIL).await;
    let user_key = register(&app, "user@example.com").await;

    let (_, body) = send(&app, "GET", "/api/v1/users/me", Some(&admin_key), None).await;
    assert_eq!(body["data"]["is_superuser"], true);

    let (status, _) = send(&app, "GET", "/api/v1/users", Some(&user_key), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "GET", "/api/v1/users", Some(&admin_key), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["items"][0]["email"], "user@example.com");

    let (status, _) = send(
        &app,
        "PUT",
        "/api/v1/parsers/animego",
        Some(&user_key),
        Some(json!({ "name": "AnimeGO" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_profile_update_and_public_view() {
    let app = spawn_app().await;
    let api_key = register(&app, "user@example.com").await;

    let (status, body) = send(
        &app,
        "PATCH",
        "/api/v1/users/me",
        Some(&api_key),
        Some(json!({ "name": "Fern", "avatar_url": "https://img.example/fern.png" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Fern");

    let user_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "GET", &format!("/api/v1/users/{user_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Fern");
    assert!(body["data"].get("email").is_none());

    let (status, _) = send(
        &app,
        "PATCH",
        "/api/v1/users/me",
        Some(&api_key),
        Some(json!({ "avatar_url": "not a url" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/v1/users/{}", uuid::Uuid::new_v4()),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_registration_can_be_closed() {
    let app = spawn_app_with(&[("USERS_OPEN_REGISTRATION", "false")]).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({ "email": "late@example.com", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_parser_sync_listing_and_search() {
    let app = spawn_app().await;
    let admin_key = register(&app, ADMIN_EMAIL).await;
    create_parser(&app, &admin_key, "animego").await;

    let (status, body) = send(&app, "GET", "/api/v1/parsers", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], "animego");

    let synced = sync_titles(
        &app,
        &admin_key,
        "animego",
        json!([
            { "id_on_website": "100", "name": "Провожающая Фрирен", "en_name": "Frieren", "genres": ["Fantasy", "Adventure"] },
            { "id_on_website": "200", "name": "Ванпанчмен", "en_name": "One Punch Man", "genres": ["Action", "fantasy"] },
        ]),
    )
    .await;
    assert_eq!(synced["created"], 2);
    assert_eq!(synced["updated"], 0);

    // A second sync updates in place and keeps the English name when none is sent.
    let resynced = sync_titles(
        &app,
        &admin_key,
        "animego",
        json!([{ "id_on_website": "100", "name": "Фрирен", "en_name": "", "genres": ["Fantasy"] }]),
    )
    .await;
    assert_eq!(resynced["created"], 0);
    assert_eq!(resynced["updated"], 1);
    assert_eq!(resynced["titles"][0]["name"], "Фрирен");
    assert_eq!(resynced["titles"][0]["en_name"], "Frieren");

    let (_, body) = send(&app, "GET", "/api/v1/titles/count", None, None).await;
    assert_eq!(body["data"]["count"], 2);

    let (_, body) = send(&app, "GET", "/api/v1/titles?page=1&page_size=1", None, None).await;
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["total_pages"], 2);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "GET", "/api/v1/titles?page=0", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/api/v1/titles?page_size=500", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, "GET", "/api/v1/titles/search?q=frieren", None, None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["id_on_website"], "100");

    let (_, body) = send(&app, "GET", "/api/v1/titles/search?q=%25", None, None).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, _) = send(&app, "GET", "/api/v1/titles/search?q=%20", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, "GET", "/api/v1/parsers/animego/titles", None, None).await;
    assert_eq!(body["data"]["total"], 2);

    // Genres are shared case-insensitively across titles.
    let (_, body) = send(&app, "GET", "/api/v1/genres", None, None).await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Action", "Adventure", "Fantasy"]);

    let fantasy_id = body["data"][2]["id"].as_str().unwrap().to_string();
    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/v1/genres/{fantasy_id}/titles"),
        None,
        None,
    )
    .await;
    assert_eq!(body["data"]["total"], 2);

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/parsers/unknown/titles",
        Some(&admin_key),
        Some(json!({ "titles": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/titles/lookup",
        None,
        Some(json!({ "website_ids": ["200", "999"], "parser_id": "animego" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["en_name"], "One Punch Man");
}

#[tokio::test]
async fn test_cyrillic_search_and_genres() {
    let app = spawn_app().await;
    let admin_key = register(&app, ADMIN_EMAIL).await;
    create_parser(&app, &admin_key, "animego").await;

    for _ in 0..2 {
        sync_titles(
            &app,
            &admin_key,
            "animego",
            json!([{ "id_on_website": "100", "name": "Фрирен", "genres": ["Драма", "драма"] }]),
        )
        .await;
    }
    sync_titles(
        &app,
        &admin_key,
        "animego",
        json!([{ "id_on_website": "200", "name": "Ёлки", "genres": ["ДРАМА"] }]),
    )
    .await;

    let (_, body) = send(&app, "GET", "/api/v1/genres", None, None).await;
    let genres = body["data"].as_array().unwrap();
    assert_eq!(genres.len(), 1);
    assert_eq!(genres[0]["name"], "Драма");

    for query in ["фрирен", "ФРИРЕН"] {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        let (status, body) = send(
            &app,
            "GET",
            &format!("/api/v1/titles/search?q={encoded}"),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body["data"]).len(), 1, "query {query}");
        assert_eq!(body["data"][0]["id_on_website"], "100");
    }
}

#[tokio::test]
async fn test_sync_rejects_whole_batch_with_bad_item() {
    let app = spawn_app().await;
    let admin_key = register(&app, ADMIN_EMAIL).await;
    create_parser(&app, &admin_key, "animego").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/parsers/animego/titles",
        Some(&admin_key),
        Some(json!({ "titles": [
            { "id_on_website": "1", "name": "Ok" },
            { "id_on_website": "", "name": "Bad" },
        ] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, "GET", "/api/v1/titles/count", None, None).await;
    assert_eq!(body["data"]["count"], 0);

    sync_titles(
        &app,
        &admin_key,
        "animego",
        json!([{ "id_on_website": "100", "name": "Frieren" }]),
    )
    .await;
    let title_id = {
        let (_, body) = send(&app, "GET", "/api/v1/titles/search?q=frieren", None, None).await;
        body["data"][0]["id"].as_str().unwrap().to_string()
    };

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/parsers/animego/titles/100/episodes",
        Some(&admin_key),
        Some(json!({ "episodes": [
            { "id_on_website": "e1", "name": "Episode 1" },
            { "id_on_website": " ", "name": "Episode 2" },
        ] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/v1/titles/{title_id}/episodes"),
        None,
        None,
    )
    .await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_linking_titles_across_parsers() {
    let app = spawn_app().await;
    let admin_key = register(&app, ADMIN_EMAIL).await;
    create_parser(&app, &admin_key, "animego").await;
    create_parser(&app, &admin_key, "animevost").await;
    create_parser(&app, &admin_key, "anilibria").await;

    let a = sync_titles(
        &app,
        &admin_key,
        "animego",
        json!([{ "id_on_website": "a1", "name": "Frieren" }]),
    )
    .await;
    let b = sync_titles(
        &app,
        &admin_key,
        "animevost",
        json!([{ "id_on_website": "b1", "name": "Frieren (vost)" }]),
    )
    .await;
    let a_id = a["titles"][0]["id"].as_str().unwrap().to_string();
    let b_id = b["titles"][0]["id"].as_str().unwrap().to_string();

    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/v1/titles/{a_id}/related"),
        None,
        None,
    )
    .await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/titles/{a_id}/link"),
        Some(&admin_key),
        Some(json!({ "parser_id": "animevost", "id_on_website": "b1", "name": "Frieren (vost)" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body["data"]), vec![b_id.clone()]);

    // Linking to an unknown title creates it on the other parser.
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/titles/{a_id}/link"),
        Some(&admin_key),
        Some(json!({ "parser_id": "anilibria", "id_on_website": "c1", "name": "Frieren (libria)" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/v1/titles/{b_id}/related"),
        None,
        None,
    )
    .await;
    let related = ids(&body["data"]);
    assert_eq!(related.len(), 2);
    assert!(related.contains(&a_id));
    assert!(!related.contains(&b_id));

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/titles/{a_id}/link"),
        Some(&admin_key),
        Some(json!({ "parser_id": "animego", "id_on_website": "a1", "name": "Frieren" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/titles/{a_id}/link"),
        Some(&admin_key),
        Some(json!({ "parser_id": "missing", "id_on_website": "x", "name": "X" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_linking_merges_existing_groups() {
    let app = spawn_app().await;
    let admin_key = register(&app, ADMIN_EMAIL).await;
    for parser in ["p1", "p2", "p3", "p4"] {
        create_parser(&app, &admin_key, parser).await;
    }

    let first = sync_titles(&app, &admin_key, "p1", json!([{ "id_on_website": "1", "name": "One" }])).await;
    let first_id = first["titles"][0]["id"].as_str().unwrap().to_string();
    let third = sync_titles(&app, &admin_key, "p3", json!([{ "id_on_website": "3", "name": "Three" }])).await;
    let third_id = third["titles"][0]["id"].as_str().unwrap().to_string();

    send(
        &app,
        "POST",
        &format!("/api/v1/titles/{first_id}/link"),
        Some(&admin_key),
        Some(json!({ "parser_id": "p2", "id_on_website": "2", "name": "Two" })),
    )
    .await;
    send(
        &app,
        "POST",
        &format!("/api/v1/titles/{third_id}/link"),
        Some(&admin_key),
        Some(json!({ "parser_id": "p4", "id_on_website": "4", "name": "Four" })),
    )
    .await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/titles/{first_id}/link"),
        Some(&admin_key),
        Some(json!({ "parser_id": "p3", "id_on_website": "3", "name": "Three" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/v1/titles/{third_id}/related"),
        None,
        None,
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_shikimori_id_and_title_details() {
    let app = spawn_app().await;
    let admin_key = register(&app, ADMIN_EMAIL).await;
    let user_key = register(&app, "user@example.com").await;
    create_parser(&app, &admin_key, "animego").await;
    create_parser(&app, &admin_key, "animevost").await;

    let a = sync_titles(
        &app,
        &admin_key,
        "animego",
        json!([{ "id_on_website": "a1", "name": "Frieren", "genres": ["Fantasy"] }]),
    )
    .await;
    let b = sync_titles(
        &app,
        &admin_key,
        "animevost",
        json!([{ "id_on_website": "b1", "name": "Frieren" }]),
    )
    .await;
    let a_id = a["titles"][0]["id"].as_str().unwrap().to_string();
    let b_id = b["titles"][0]["id"].as_str().unwrap().to_string();

    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/v1/titles/{a_id}/other-parsers"),
        None,
        None,
    )
    .await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/v1/titles/{a_id}/shikimori"),
        Some(&user_key),
        Some(json!({ "shikimori_id": 52991 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    for id in [&a_id, &b_id] {
        let (status, body) = send(
            &app,
            "PUT",
            &format!("/api/v1/titles/{id}/shikimori"),
            Some(&admin_key),
            Some(json!({ "shikimori_id": 52991 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["shikimori_id"], 52991);
        assert_eq!(body["data"]["shikimori_fetched"], true);
    }

    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/v1/titles/{a_id}/other-parsers"),
        None,
        None,
    )
    .await;
    assert_eq!(ids(&body["data"]), vec![b_id.clone()]);

    send(
        &app,
        "POST",
        &format!("/api/v1/titles/{a_id}/favorite"),
        Some(&user_key),
        None,
    )
    .await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/titles/{a_id}"),
        Some(&user_key),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], a_id.as_str());
    assert_eq!(body["data"]["genres"][0]["name"], "Fantasy");
    assert_eq!(ids(&body["data"]["other_parsers"]), vec![b_id]);
    assert_eq!(body["data"]["is_favorite"], true);

    let (_, body) = send(&app, "GET", &format!("/api/v1/titles/{a_id}"), None, None).await;
    assert_eq!(body["data"]["is_favorite"], false);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/v1/titles/{}", uuid::Uuid::new_v4()),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_favorites() {
    let app = spawn_app().await;
    let admin_key = register(&app, ADMIN_EMAIL).await;
    let user_key = register(&app, "user@example.com").await;
    create_parser(&app, &admin_key, "animego").await;

    let synced = sync_titles(
        &app,
        &admin_key,
        "animego",
        json!([
            { "id_on_website": "1", "name": "First" },
            { "id_on_website": "2", "name": "Second" },
        ]),
    )
    .await;
    let first_id = synced["titles"][0]["id"].as_str().unwrap().to_string();

    for _ in 0..2 {
        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/titles/{first_id}/favorite"),
            Some(&user_key),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["is_favorite"], true);
    }

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/titles/{first_id}/favorite"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, body) = send(&app, "GET", "/api/v1/users/me/favorites", Some(&user_key), None).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], first_id.as_str());

    let (_, body) = send(&app, "GET", "/api/v1/users/me/favorites", Some(&admin_key), None).await;
    assert_eq!(body["data"]["total"], 0);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/titles/{first_id}/favorite"),
        Some(&user_key),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", "/api/v1/users/me/favorites", Some(&user_key), None).await;
    assert_eq!(body["data"]["total"], 0);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/titles/{}/favorite", uuid::Uuid::new_v4()),
        Some(&user_key),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_episodes_and_progress() {
    let app = spawn_app().await;
    let admin_key = register(&app, ADMIN_EMAIL).await;
    let user_key = register(&app, "user@example.com").await;
    create_parser(&app, &admin_key, "animego").await;

    let synced = sync_titles(
        &app,
        &admin_key,
        "animego",
        json!([{ "id_on_website": "100", "name": "Frieren" }]),
    )
    .await;
    let title_id = synced["titles"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/parsers/animego/titles/100/episodes",
        Some(&admin_key),
        Some(json!({ "episodes": [
            { "id_on_website": "e2", "name": "Episode 2", "number": 2.0 },
            { "id_on_website": "e1", "name": "Episode 1", "number": 1.0 },
        ] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    // Re-syncing renames instead of duplicating.
    send(
        &app,
        "POST",
        "/api/v1/parsers/animego/titles/100/episodes",
        Some(&admin_key),
        Some(json!({ "episodes": [{ "id_on_website": "e1", "name": "The Journey's End" }] })),
    )
    .await;

    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/v1/titles/{title_id}/episodes"),
        None,
        None,
    )
    .await;
    let episodes = body["data"].as_array().unwrap();
    assert_eq!(episodes.len(), 2);
    assert_eq!(episodes[0]["name"], "The Journey's End");
    assert_eq!(episodes[0]["number"], 1.0);
    let episode_id = episodes[0]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/episodes/{episode_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title_id"], title_id.as_str());

    let progress_uri = format!("/api/v1/episodes/{episode_id}/progress");

    let (status, _) = send(&app, "GET", &progress_uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, body) = send(&app, "GET", &progress_uri, Some(&user_key), None).await;
    assert_eq!(body["data"]["seconds"], 0.0);
    assert_eq!(body["data"]["completed"], false);

    let (status, body) = send(
        &app,
        "PUT",
        &progress_uri,
        Some(&user_key),
        Some(json!({ "seconds": 754.5, "completed": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["seconds"], 754.5);

    send(
        &app,
        "PUT",
        &progress_uri,
        Some(&user_key),
        Some(json!({ "seconds": 1420.0, "completed": true })),
    )
    .await;

    let (_, body) = send(&app, "GET", &progress_uri, Some(&user_key), None).await;
    assert_eq!(body["data"]["seconds"], 1420.0);
    assert_eq!(body["data"]["completed"], true);

    // Progress is per user.
    let (_, body) = send(&app, "GET", &progress_uri, Some(&admin_key), None).await;
    assert_eq!(body["data"]["seconds"], 0.0);

    let (status, _) = send(
        &app,
        "PUT",
        &progress_uri,
        Some(&user_key),
        Some(json!({ "seconds": -5.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/parsers/animego/titles/missing/episodes",
        Some(&admin_key),
        Some(json!({ "episodes": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_messages() {
    let app = spawn_app().await;
    let admin_key = register(&app, ADMIN_EMAIL).await;
    let author_key = register(&app, "author@example.com").await;
    let other_key = register(&app, "other@example.com").await;
    create_parser(&app, &admin_key, "animego").await;

    let synced = sync_titles(
        &app,
        &admin_key,
        "animego",
        json!([{ "id_on_website": "1", "name": "Frieren" }]),
    )
    .await;
    let title_id = synced["titles"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/messages",
        Some(&author_key),
        Some(json!({ "title_id": title_id, "text": "  Best show of the season  " })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["text"], "Best show of the season");
    let message_id = body["data"]["id"].as_str().unwrap().to_string();

    send(
        &app,
        "POST",
        "/api/v1/messages",
        Some(&other_key),
        Some(json!({ "title_id": title_id, "text": "Agreed" })),
    )
    .await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/messages?title_id={title_id}&page_size=10"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["items"][0]["text"], "Agreed");

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/messages",
        Some(&author_key),
        Some(json!({ "title_id": title_id, "text": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/messages",
        Some(&author_key),
        Some(json!({ "title_id": uuid::Uuid::new_v4(), "text": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let message_uri = format!("/api/v1/messages/{message_id}");

    let (status, _) = send(&app, "DELETE", &message_uri, Some(&other_key), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "DELETE", &message_uri, Some(&author_key), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], true);

    let (status, _) = send(&app, "DELETE", &message_uri, Some(&author_key), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_file_upload_download_and_delete() {
    let app = spawn_app().await;
    let owner_key = register(&app, "owner@example.com").await;
    let other_key = register(&app, "other@example.com").await;

    let boundary = "anilink-test-boundary";
    let payload = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"../notes.txt\"\r\n\
         Content-Type: text/plain\r\n\r\n\
         hello anilink\r\n\
         --{boundary}--\r\n"
    );

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/files")
                .header("Authorization", format!("Bearer {owner_key}"))
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["data"]["filename"], "notes.txt");
    assert_eq!(body["data"]["size"], 13);
    let file_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "GET", &format!("/api/v1/files/{file_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["content_type"], "text/plain");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/files/{file_id}/content"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/plain");
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"hello anilink");

    let file_uri = format!("/api/v1/files/{file_id}");

    let (status, _) = send(&app, "DELETE", &file_uri, Some(&other_key), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "DELETE", &file_uri, Some(&owner_key), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", &file_uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_requires_file_field() {
    let app = spawn_app().await;
    let api_key = register(&app, "owner@example.com").await;

    let boundary = "b";
    let payload =
        format!("--{boundary}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nx\r\n--{boundary}--\r\n");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/files")
                .header("Authorization", format!("Bearer {api_key}"))
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_over_limit_is_rejected() {
    let app = spawn_app_with(&[("MAX_UPLOAD_BYTES", "64")]).await;
    let api_key = register(&app, "owner@example.com").await;

    let boundary = "anilink-test-boundary";
    let content = "x".repeat(500);
    let payload = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"big.txt\"\r\n\
         Content-Type: text/plain\r\n\r\n\
         {content}\r\n\
         --{boundary}--\r\n"
    );

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/files")
                .header("Authorization", format!("Bearer {api_key}"))
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
