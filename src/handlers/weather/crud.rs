//! Reading create/update/delete endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::reading::ReadingField;
use crate::database::models::{ReadingInput, ReadingUpdate};
use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::state::AppState;

/// POST /api/weather - Insert a single reading
pub async fn insert(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let input: ReadingInput = serde_json::from_value(payload)
        .map_err(|_| ApiError::bad_request("Missing fields Required"))?;
    input.validate()?;

    let reading = state.readings.insert(&input).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Weather data inserted successfully",
            "weather": reading
        })),
    ))
}

/// POST /api/weather/multiple - Bulk insert
///
/// Every entry is deserialized and range-checked before any insertion; a
/// single bad entry rejects the whole batch with nothing written.
pub async fn insert_many(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = match payload.as_array() {
        Some(entries) if !entries.is_empty() => entries,
        _ => {
            return Err(ApiError::bad_request(
                "Request body must be a non-empty array of weather data",
            ))
        }
    };

    let mut inputs = Vec::with_capacity(entries.len());
    for entry in entries {
        let input: ReadingInput = serde_json::from_value(entry.clone()).map_err(|_| {
            ApiError::bad_request("Missing fields in one or more weather data entries")
        })?;
        input.validate()?;
        inputs.push(input);
    }

    let readings = state.readings.insert_many(&inputs).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": format!("{} weather records inserted successfully", readings.len()),
            "weather": readings
        })),
    ))
}

/// GET /api/weather/:id - Fetch one reading
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_reading_id(&id)?;
    let reading = state
        .readings
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Weather data not found"))?;
    Ok(ApiResponse::success(reading))
}

/// PUT /api/weather/:id - Update one reading (full or partial)
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_reading_id(&id)?;
    let input: ReadingUpdate = serde_json::from_value(payload)
        .map_err(|e| ApiError::bad_request(format!("Invalid update payload: {}", e)))?;
    input.validate()?;

    let reading = state
        .readings
        .update(id, &input)
        .await?
        .ok_or_else(|| ApiError::not_found("Weather entry not found"))?;

    Ok(Json(json!({
        "success": true,
        "message": "Weather data updated successfully",
        "weather": reading
    })))
}

/// PUT /api/weather/:id/precipitation - Update only the precipitation value
pub async fn update_precipitation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_reading_id(&id)?;

    // Accept the canonical key or the legacy display label
    let precipitation = payload
        .get(ReadingField::Precipitation.column())
        .or_else(|| payload.get(ReadingField::Precipitation.label()))
        .and_then(Value::as_f64)
        .ok_or_else(|| ApiError::bad_request("Precipitation value is required"))?;

    let reading = state
        .readings
        .update_precipitation(id, precipitation)
        .await?
        .ok_or_else(|| ApiError::not_found("Weather entry not found"))?;

    Ok(Json(json!({
        "success": true,
        "message": "Precipitation updated successfully",
        "weather": reading
    })))
}

/// DELETE /api/weather/:id - Delete one reading
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_reading_id(&id)?;
    let reading = state
        .readings
        .delete(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Weather data not found"))?;

    Ok(Json(json!({
        "success": true,
        "message": "Weather data deleted successfully",
        "weather": reading
    })))
}

fn parse_reading_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request("Invalid reading id"))
}
