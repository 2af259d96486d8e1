//! User administration endpoints (Admin/Teacher only; see the route table).

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::password;
use crate::database::models::UserUpdateInput;
use crate::database::users::UserChanges;
use crate::dates;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/users - List all users
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let users = state.users.list().await?;
    Ok(Json(json!({ "success": true, "users": users })))
}

/// GET /api/users/:id - Fetch one user
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_user_id(&id)?;
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(json!({ "success": true, "user": user })))
}

/// PUT /api/users/:id - Update one user (password re-hashed when present)
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_user_id(&id)?;
    let input: UserUpdateInput = serde_json::from_value(payload)
        .map_err(|e| ApiError::bad_request(format!("Invalid update payload: {}", e)))?;
    let role = input.validate()?;

    let password_hash = match &input.password {
        Some(plain) => Some(password::hash(plain)?),
        None => None,
    };

    let changes = UserChanges {
        name: input.name,
        email: input.email,
        password_hash,
        role,
    };

    let user = state
        .users
        .update(id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(json!({
        "success": true,
        "message": "User updated successfully",
        "user": user
    })))
}

/// DELETE /api/users/:id - Delete one user
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_user_id(&id)?;
    if !state.users.delete(id).await? {
        return Err(ApiError::not_found("User not found"));
    }
    Ok(Json(json!({
        "success": true,
        "message": "User deleted successfully"
    })))
}

/// DELETE /api/users/deleteStudents - Bulk-delete students by last-login range
pub async fn delete_students(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let (start, end) = parse_range_body(payload)?;
    let deleted = state.users.delete_students_in_range(start, end).await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("{} students deleted successfully", deleted)
    })))
}

/// PUT /api/users/updateRole - Promote users created in a date range to Teacher
pub async fn update_role(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let (start, end) = parse_range_body(payload)?;
    let updated = state.users.promote_in_range(start, end).await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("{} users updated successfully", updated)
    })))
}

fn parse_user_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request("Invalid user id"))
}

#[derive(Debug, Default, Deserialize)]
struct DateRangeBody {
    #[serde(rename = "startDate")]
    start_date: Option<String>,
    #[serde(rename = "endDate")]
    end_date: Option<String>,
}

fn parse_range_body(payload: Value) -> Result<(DateTime<Utc>, DateTime<Utc>), ApiError> {
    let body: DateRangeBody = serde_json::from_value(payload).unwrap_or_default();
    let (start, end) = match (body.start_date, body.end_date) {
        (Some(s), Some(e)) => (s, e),
        _ => return Err(ApiError::bad_request("Please provide a start and end date")),
    };

    let parse = |raw: &str| {
        dates::parse_flexible(raw).map_err(|_| {
            ApiError::bad_request("Invalid date format. Please use YYYY-MM-DD format.")
        })
    };

    Ok((parse(&start)?, parse(&end)?))
}
