mod common;

use anyhow::Result;
use axum::http::StatusCode;
use axum::{middleware, routing::get, Router};
use serde_json::json;
use tower::ServiceExt;

use weather_station_api::config::AppConfig;
use weather_station_api::error::ApiError;
use weather_station_api::middleware::errors::redact_error_details;

async fn boom() -> ApiError {
    ApiError::Internal {
        message: "Database error occurred".to_string(),
        detail: Some("connection to 10.0.0.5:5432 refused".to_string()),
    }
}

fn app_with_config(config: AppConfig) -> Router {
    let state = common::test_state(config);
    Router::new()
        .route("/boom", get(boom))
        .layer(middleware::from_fn_with_state(state, redact_error_details))
}

#[tokio::test]
async fn production_strips_internal_detail() -> Result<()> {
    let app = app_with_config(AppConfig::production());

    let res = app.oneshot(common::get("/boom")).await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = common::body_json(res).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("Database error occurred"));
    assert!(body.get("detail").is_none(), "detail leaked: {}", body);
    Ok(())
}

#[tokio::test]
async fn development_keeps_internal_detail() -> Result<()> {
    let app = app_with_config(AppConfig::development());

    let res = app.oneshot(common::get("/boom")).await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = common::body_json(res).await;
    assert_eq!(
        body["detail"],
        json!("connection to 10.0.0.5:5432 refused")
    );
    Ok(())
}

#[tokio::test]
async fn client_errors_pass_through_untouched() -> Result<()> {
    let state = common::test_state(AppConfig::production());
    let app = Router::new()
        .route(
            "/teapot",
            get(|| async { ApiError::bad_request("short and stout") }),
        )
        .layer(middleware::from_fn_with_state(state, redact_error_details));

    let res = app.oneshot(common::get("/teapot")).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = common::body_json(res).await;
    assert_eq!(body["message"], json!("short and stout"));
    Ok(())
}
