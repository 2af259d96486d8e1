use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::Router;
use serde_json::Value;

use weather_station_api::{app, config::AppConfig, state::AppState};

/// Build an AppState over a lazy pool; nothing here ever reaches a real
/// database, so the URL only has to parse.
pub fn test_state(mut config: AppConfig) -> AppState {
    config.security.jwt_secret = "integration-test-secret".to_string();
    if config.database.url.is_none() {
        config.database.url = Some("postgres://postgres@localhost:1/weather_test".to_string());
    }

    let pool = sqlx::postgres::PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy(config.database.url.as_deref().unwrap())
        .expect("lazy pool");

    AppState::new(Arc::new(config), pool).expect("app state")
}

pub fn app_with(config: AppConfig) -> Router {
    app::router(test_state(config))
}

pub fn get(path: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(path)
        .body(Body::empty())
        .unwrap()
}

pub fn get_with_cookie(path: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(path)
        .header("cookie", cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(path: &str, payload: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}
