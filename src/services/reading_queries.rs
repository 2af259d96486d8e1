//! The reading query layer: validates inputs and deterministically shapes
//! the time-window and aggregate queries over stored readings.

use chrono::{DateTime, Months, Utc};
use serde_json::json;
use thiserror::Error;

use crate::database::manager::DatabaseError;
use crate::database::models::reading::ReadingField;
use crate::database::models::{
    MaxPrecipitationRecord, MaxTemperatureRecord, RangeScanRow, StationSnapshot,
};
use crate::database::readings::ReadingStore;
use crate::dates;
use crate::filter::FilterData;

/// Trailing window for the per-device maximum precipitation query.
pub const TRAILING_WINDOW_MONTHS: u32 = 5;

/// Hard cap on rows returned by the humidity/precipitation range scan.
pub const RANGE_SCAN_LIMIT: i32 = 10;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NoData(String),

    #[error(transparent)]
    Store(#[from] DatabaseError),
}

impl From<QueryError> for crate::error::ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::InvalidInput(msg) => crate::error::ApiError::bad_request(msg),
            QueryError::NoData(msg) => crate::error::ApiError::not_found(msg),
            QueryError::Store(db) => db.into(),
        }
    }
}

/// Start of the trailing window ending at `now`.
pub fn trailing_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(TRAILING_WINDOW_MONTHS))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn columns(fields: &[ReadingField]) -> Vec<String> {
    fields.iter().map(|f| f.column().to_string()).collect()
}

/// Highest precipitation for one device since the window start. Ties on
/// precipitation resolve to the most recent reading.
pub fn max_precipitation_filter(device_name: &str, since: DateTime<Utc>) -> FilterData {
    FilterData {
        select: Some(columns(&[
            ReadingField::DeviceName,
            ReadingField::Precipitation,
            ReadingField::Time,
        ])),
        where_clause: Some(json!({
            "device_name": device_name,
            "time": { "$gte": since.to_rfc3339() }
        })),
        order: Some(json!("precipitation desc, time desc")),
        limit: Some(1),
        offset: None,
    }
}

/// Highest temperature across all devices within [start, end] inclusive.
/// Same tie-break: most recent first.
pub fn max_temperature_filter(start: DateTime<Utc>, end: DateTime<Utc>) -> FilterData {
    FilterData {
        select: Some(columns(&[
            ReadingField::DeviceName,
            ReadingField::Time,
            ReadingField::Temperature,
        ])),
        where_clause: Some(json!({
            "time": { "$between": [start.to_rfc3339(), end.to_rfc3339()] }
        })),
        order: Some(json!("temperature desc, time desc")),
        limit: Some(1),
        offset: None,
    }
}

/// Exact device + timestamp lookup; equality at stored precision, never
/// widened to a range.
pub fn station_snapshot_filter(device_name: &str, at: DateTime<Utc>) -> FilterData {
    FilterData {
        select: Some(columns(&[
            ReadingField::DeviceName,
            ReadingField::Temperature,
            ReadingField::AtmosphericPressure,
            ReadingField::SolarRadiation,
            ReadingField::Precipitation,
            ReadingField::VaporPressure,
            ReadingField::Humidity,
            ReadingField::MaxWindSpeed,
            ReadingField::WindDirection,
            ReadingField::Time,
        ])),
        where_clause: Some(json!({
            "device_name": device_name,
            "time": at.to_rfc3339()
        })),
        order: None,
        limit: Some(1),
        offset: None,
    }
}

/// Chronological scan of [start, end], capped at [`RANGE_SCAN_LIMIT`] rows.
pub fn range_scan_filter(start: DateTime<Utc>, end: DateTime<Utc>) -> FilterData {
    FilterData {
        select: Some(columns(&[
            ReadingField::DeviceName,
            ReadingField::Temperature,
            ReadingField::Humidity,
            ReadingField::Precipitation,
            ReadingField::Time,
        ])),
        where_clause: Some(json!({
            "time": { "$between": [start.to_rfc3339(), end.to_rfc3339()] }
        })),
        order: Some(json!("time asc")),
        limit: Some(RANGE_SCAN_LIMIT),
        offset: None,
    }
}

fn parse_range(
    start: Option<&str>,
    end: Option<&str>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), QueryError> {
    let (start, end) = match (start, end) {
        (Some(s), Some(e)) => (s, e),
        _ => {
            return Err(QueryError::InvalidInput(
                "Invalid date range. Please provide both start and end dates.".to_string(),
            ))
        }
    };

    let parse = |raw: &str| {
        dates::parse_flexible(raw).map_err(|_| {
            QueryError::InvalidInput(
                "Invalid date format. Please use YYYY-MM-DD format.".to_string(),
            )
        })
    };

    Ok((parse(start)?, parse(end)?))
}

/// Executes the query layer against the reading store.
#[derive(Clone)]
pub struct ReadingQueries {
    store: ReadingStore,
}

impl ReadingQueries {
    pub fn new(store: ReadingStore) -> Self {
        Self { store }
    }

    pub async fn max_precipitation(
        &self,
        device_name: &str,
    ) -> Result<MaxPrecipitationRecord, QueryError> {
        let since = trailing_window_start(Utc::now());
        let filter = max_precipitation_filter(device_name, since);

        self.store
            .repository::<MaxPrecipitationRecord>()
            .select_one(filter)
            .await?
            .ok_or_else(|| {
                QueryError::NoData(
                    "No data found for this device in the last 5 months".to_string(),
                )
            })
    }

    pub async fn max_temperature(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<MaxTemperatureRecord, QueryError> {
        let (start, end) = parse_range(start, end)?;
        let filter = max_temperature_filter(start, end);

        self.store
            .repository::<MaxTemperatureRecord>()
            .select_one(filter)
            .await?
            .ok_or_else(|| {
                QueryError::NoData(
                    "No temperature data found for the given date range.".to_string(),
                )
            })
    }

    pub async fn station_snapshot(
        &self,
        device_name: &str,
        time: &str,
    ) -> Result<StationSnapshot, QueryError> {
        let at = dates::parse_flexible(time).map_err(|_| {
            QueryError::InvalidInput(
                "Invalid date format. Please use YYYY-MM-DDTHH:mm:ss format.".to_string(),
            )
        })?;
        let filter = station_snapshot_filter(device_name, at);

        self.store
            .repository::<StationSnapshot>()
            .select_required(filter)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound(_) => QueryError::NoData("No data found".to_string()),
                other => QueryError::Store(other),
            })
    }

    pub async fn temperature_humidity(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Vec<RangeScanRow>, QueryError> {
        let (start, end) = parse_range(start, end)?;
        let filter = range_scan_filter(start, end);

        let rows = self
            .store
            .repository::<RangeScanRow>()
            .select_any(filter)
            .await?;
        if rows.is_empty() {
            return Err(QueryError::NoData(
                "No data found for the specified date range".to_string(),
            ));
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;
    use chrono::TimeZone;

    fn render(filter_data: FilterData) -> crate::filter::SqlResult {
        let mut filter = Filter::new("weather_readings").unwrap();
        filter.assign(filter_data).unwrap();
        filter.to_sql().unwrap()
    }

    #[test]
    fn trailing_window_is_five_months() {
        let now = Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap();
        assert_eq!(
            trailing_window_start(now),
            Utc.with_ymd_and_hms(2024, 2, 15, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn trailing_window_clamps_short_months() {
        let now = Utc.with_ymd_and_hms(2024, 7, 31, 0, 0, 0).unwrap();
        // February has no 31st; chrono clamps to the 29th (leap year)
        assert_eq!(
            trailing_window_start(now),
            Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn max_precipitation_sorts_desc_with_recency_tiebreak() {
        let since = Utc.with_ymd_and_hms(2024, 2, 15, 0, 0, 0).unwrap();
        let sql = render(max_precipitation_filter("sensor-a", since));
        assert_eq!(
            sql.query,
            "SELECT \"device_name\", \"precipitation\", \"time\" \
             FROM \"weather_readings\" \
             WHERE \"device_name\" = $1 AND \"time\" >= $2 \
             ORDER BY \"precipitation\" DESC, \"time\" DESC LIMIT 1"
        );
        assert_eq!(sql.params[0], serde_json::json!("sensor-a"));
    }

    #[test]
    fn max_temperature_is_inclusive_range_limit_one() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let sql = render(max_temperature_filter(start, end));
        assert_eq!(
            sql.query,
            "SELECT \"device_name\", \"time\", \"temperature\" \
             FROM \"weather_readings\" \
             WHERE \"time\" BETWEEN $1 AND $2 \
             ORDER BY \"temperature\" DESC, \"time\" DESC LIMIT 1"
        );
        assert_eq!(sql.params.len(), 2);
    }

    #[test]
    fn station_snapshot_matches_timestamp_exactly() {
        let at = Utc.with_ymd_and_hms(2021, 1, 7, 1, 55, 22).unwrap();
        let sql = render(station_snapshot_filter("sensor-a", at));
        // Equality, not a range: the timestamp must match stored precision
        assert!(sql.query.contains("\"time\" = $2"));
        assert!(!sql.query.contains("BETWEEN"));
        assert!(sql.query.contains("\"device_name\" = $1"));
        assert!(sql.query.ends_with("LIMIT 1"));
    }

    #[test]
    fn range_scan_is_chronological_and_capped() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let sql = render(range_scan_filter(start, end));
        assert!(sql.query.contains("ORDER BY \"time\" ASC"));
        assert!(sql.query.ends_with("LIMIT 10"));
    }

    #[test]
    fn range_parsing_requires_both_dates() {
        assert!(matches!(
            parse_range(Some("2024-01-01"), None),
            Err(QueryError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_range(None, Some("2024-01-31")),
            Err(QueryError::InvalidInput(_))
        ));
        assert!(parse_range(Some("2024-01-01"), Some("2024-01-31")).is_ok());
    }

    #[test]
    fn range_parsing_rejects_malformed_dates() {
        assert!(matches!(
            parse_range(Some("yesterday"), Some("2024-01-31")),
            Err(QueryError::InvalidInput(_))
        ));
    }
}
