//! Registration, login, and logout.

use axum::{
    extract::State,
    http::{header::SET_COOKIE, StatusCode},
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{cookie, password};
use crate::database::models::{PublicUser, RegisterInput};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/register - Create a user account and issue a token cookie
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let input: RegisterInput = serde_json::from_value(payload)
        .map_err(|e| ApiError::bad_request(format!("Invalid registration payload: {}", e)))?;
    let role = input.validate()?;

    let password_hash = password::hash(&input.password)?;
    let user = state
        .users
        .create(&input.name, &input.email, &password_hash, role)
        .await?;

    let token = state.tokens.issue(user.id, user.role)?;
    let cookie = cookie::auth_cookie(&token, &state.config.security);

    tracing::info!("Registered user {} with role {}", user.email, user.role);

    Ok((
        StatusCode::CREATED,
        [(SET_COOKIE, cookie)],
        Json(json!({ "success": true, "user": user, "token": token })),
    ))
}

#[derive(Debug, Default, Deserialize)]
struct LoginInput {
    email: Option<String>,
    password: Option<String>,
}

/// POST /api/login - Verify credentials and issue a token cookie
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let input: LoginInput = serde_json::from_value(payload).unwrap_or_default();
    let (email, pass) = match (input.email, input.password) {
        (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => (e, p),
        _ => return Err(ApiError::bad_request("Please provide an email and password")),
    };

    let record = state
        .users
        .find_by_email_with_hash(&email)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !password::verify(&pass, &record.password_hash)? {
        return Err(invalid_credentials());
    }

    state.users.touch_last_login(record.id).await?;

    let token = state.tokens.issue(record.id, record.role)?;
    let cookie = cookie::auth_cookie(&token, &state.config.security);
    let user = PublicUser::from(record);

    Ok((
        [(SET_COOKIE, cookie)],
        Json(json!({ "success": true, "user": user, "token": token })),
    ))
}

fn invalid_credentials() -> ApiError {
    // One message for unknown email and wrong password alike
    ApiError::unauthorized("Invalid email or password")
}

/// GET /api/logout - Clear the token cookie
pub async fn logout() -> impl IntoResponse {
    (
        [(SET_COOKIE, cookie::clear_cookie())],
        Json(json!({ "success": true, "message": "User logged out successfully" })),
    )
}
