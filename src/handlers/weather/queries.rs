//! Time-window and aggregate query endpoints. Input validation and query
//! shaping live in the reading query layer; these handlers only translate
//! HTTP in and out.

use axum::extract::{Path, Query, State};
use serde::Deserialize;

use crate::database::models::{
    MaxPrecipitationRecord, MaxTemperatureRecord, RangeScanRow, StationSnapshot,
};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DateRangeQuery {
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
}

/// GET /api/weather/:device_name/max-precipitation - Highest precipitation
/// for a device over the trailing five months
pub async fn max_precipitation(
    State(state): State<AppState>,
    Path(device_name): Path<String>,
) -> ApiResult<MaxPrecipitationRecord> {
    let record = state.queries.max_precipitation(&device_name).await?;
    Ok(ApiResponse::success(record))
}

/// GET /api/weather/max-temperature?startDate=&endDate= - Highest
/// temperature across all devices in the range
pub async fn max_temperature(
    State(state): State<AppState>,
    Query(range): Query<DateRangeQuery>,
) -> ApiResult<MaxTemperatureRecord> {
    let record = state
        .queries
        .max_temperature(range.start_date.as_deref(), range.end_date.as_deref())
        .await?;
    Ok(ApiResponse::success(record))
}

/// GET /api/weather/:device_name/:time - Exact station + timestamp lookup
pub async fn station_snapshot(
    State(state): State<AppState>,
    Path((device_name, time)): Path<(String, String)>,
) -> ApiResult<StationSnapshot> {
    let snapshot = state.queries.station_snapshot(&device_name, &time).await?;
    Ok(ApiResponse::success(snapshot))
}

/// GET /api/weather/temperature-humidity?startDate=&endDate= - Chronological
/// range scan, capped at ten rows
pub async fn temperature_humidity(
    State(state): State<AppState>,
    Query(range): Query<DateRangeQuery>,
) -> ApiResult<Vec<RangeScanRow>> {
    let rows = state
        .queries
        .temperature_humidity(range.start_date.as_deref(), range.end_date.as_deref())
        .await?;
    Ok(ApiResponse::success(rows))
}
