//! Router assembly. Each route group declares its allow-list here, so the
//! whole authorization surface reads as one table.

use axum::{
    extract::State,
    http::HeaderValue,
    middleware,
    response::{IntoResponse, Json},
    routing::{delete, get, post, put},
    Extension, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::database::manager;
use crate::handlers;
use crate::middleware::auth::{self as gate, ADMIN_ONLY, INGEST, STAFF};
use crate::middleware::errors::redact_error_details;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    // Unauthenticated
    let public = Router::new()
        .route("/api/login", post(handlers::auth::login))
        .route("/api/logout", get(handlers::auth::logout));

    // Registration: open or Admin-gated, a deployment choice
    let register = Router::new().route("/api/register", post(handlers::auth::register));
    let register = if state.config.policy.open_registration {
        register
    } else {
        role_gated(register, ADMIN_ONLY, &state)
    };

    // Single-reading ingest: open or Sensor/Admin-gated, a deployment choice
    let ingest = Router::new().route("/api/weather", post(handlers::weather::insert));
    let ingest = if state.config.policy.open_sensor_ingest {
        ingest
    } else {
        role_gated(ingest, INGEST, &state)
    };

    // Bulk ingest is always Sensor/Admin
    let ingest_bulk = role_gated(
        Router::new().route("/api/weather/multiple", post(handlers::weather::insert_many)),
        INGEST,
        &state,
    );

    // Any authenticated user: reads and aggregate queries.
    // matchit requires one parameter name per segment position, so ":id"
    // also stands in for the device name on the two device-scoped routes.
    let authenticated = Router::new()
        .route("/api/weather/max-temperature", get(handlers::weather::max_temperature))
        .route(
            "/api/weather/temperature-humidity",
            get(handlers::weather::temperature_humidity),
        )
        .route("/api/weather/:id", get(handlers::weather::get_by_id))
        .route(
            "/api/weather/:id/max-precipitation",
            get(handlers::weather::max_precipitation),
        )
        .route("/api/weather/:id/:time", get(handlers::weather::station_snapshot))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            gate::authenticate,
        ));

    // Admin/Teacher administration
    let staff = role_gated(
        Router::new()
            .route("/api/users", get(handlers::users::list))
            .route("/api/users/deleteStudents", delete(handlers::users::delete_students))
            .route("/api/users/updateRole", put(handlers::users::update_role))
            .route(
                "/api/users/:id",
                get(handlers::users::get)
                    .put(handlers::users::update)
                    .delete(handlers::users::remove),
            )
            .route(
                "/api/weather/:id",
                put(handlers::weather::update).delete(handlers::weather::remove),
            )
            .route(
                "/api/weather/:id/precipitation",
                put(handlers::weather::update_precipitation),
            ),
        STAFF,
        &state,
    );

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public)
        .merge(register)
        .merge(ingest)
        .merge(ingest_bulk)
        .merge(authenticated)
        .merge(staff)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            redact_error_details,
        ))
        .layer(cors_layer(&state.config.security))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Attach the full gate to a route group: authenticate, declare the
/// allow-list, authorize. Layers run top-down in that order.
fn role_gated(
    routes: Router<AppState>,
    allowed: gate::Allowed,
    state: &AppState,
) -> Router<AppState> {
    routes
        .route_layer(middleware::from_fn(gate::authorize))
        .route_layer(Extension(allowed))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            gate::authenticate,
        ))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Weather Station API",
            "version": version,
            "description": "Weather sensor data API with role-based access control",
            "endpoints": {
                "auth": "POST /api/register, POST /api/login, GET /api/logout",
                "users": "/api/users[/:id], /api/users/deleteStudents, /api/users/updateRole",
                "weather": "/api/weather[/:id], /api/weather/multiple",
                "queries": [
                    "GET /api/weather/:deviceName/max-precipitation",
                    "GET /api/weather/max-temperature?startDate=&endDate=",
                    "GET /api/weather/:deviceName/:time",
                    "GET /api/weather/temperature-humidity?startDate=&endDate="
                ]
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match manager::health_check(&state.pool).await {
        Ok(()) => (
            axum::http::StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "message": "database unavailable",
                "data": { "status": "degraded", "timestamp": now, "database_error": e.to_string() }
            })),
        ),
    }
}
