use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::ValidationError;

/// Physical bounds enforced at write time.
pub const TEMPERATURE_RANGE: (f64, f64) = (-50.0, 60.0);
pub const HUMIDITY_RANGE: (f64, f64) = (0.0, 100.0);

/// Canonical field identity for a reading. Storage columns are the single
/// source of truth; the display labels are the raw spreadsheet-style keys
/// sensors historically sent, kept as input aliases and for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingField {
    DeviceName,
    Precipitation,
    Time,
    Latitude,
    Longitude,
    Temperature,
    AtmosphericPressure,
    MaxWindSpeed,
    SolarRadiation,
    VaporPressure,
    Humidity,
    WindDirection,
}

impl ReadingField {
    pub const ALL: [ReadingField; 12] = [
        ReadingField::DeviceName,
        ReadingField::Precipitation,
        ReadingField::Time,
        ReadingField::Latitude,
        ReadingField::Longitude,
        ReadingField::Temperature,
        ReadingField::AtmosphericPressure,
        ReadingField::MaxWindSpeed,
        ReadingField::SolarRadiation,
        ReadingField::VaporPressure,
        ReadingField::Humidity,
        ReadingField::WindDirection,
    ];

    /// Storage column name.
    pub fn column(&self) -> &'static str {
        match self {
            ReadingField::DeviceName => "device_name",
            ReadingField::Precipitation => "precipitation",
            ReadingField::Time => "time",
            ReadingField::Latitude => "latitude",
            ReadingField::Longitude => "longitude",
            ReadingField::Temperature => "temperature",
            ReadingField::AtmosphericPressure => "atmospheric_pressure",
            ReadingField::MaxWindSpeed => "max_wind_speed",
            ReadingField::SolarRadiation => "solar_radiation",
            ReadingField::VaporPressure => "vapor_pressure",
            ReadingField::Humidity => "humidity",
            ReadingField::WindDirection => "wind_direction",
        }
    }

    /// Human-facing label with units.
    pub fn label(&self) -> &'static str {
        match self {
            ReadingField::DeviceName => "Device Name",
            ReadingField::Precipitation => "Precipitation mm/h",
            ReadingField::Time => "Time",
            ReadingField::Latitude => "Latitude",
            ReadingField::Longitude => "Longitude",
            ReadingField::Temperature => "Temperature (°C)",
            ReadingField::AtmosphericPressure => "Atmospheric Pressure (kPa)",
            ReadingField::MaxWindSpeed => "Max Wind Speed (m/s)",
            ReadingField::SolarRadiation => "Solar Radiation (W/m2)",
            ReadingField::VaporPressure => "Vapor Pressure (kPa)",
            ReadingField::Humidity => "Humidity (%)",
            ReadingField::WindDirection => "Wind Direction (°)",
        }
    }
}

/// A stored sensor observation.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WeatherReading {
    pub id: Uuid,
    pub device_name: String,
    pub precipitation: f64,
    pub time: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub temperature: f64,
    pub atmospheric_pressure: f64,
    pub max_wind_speed: f64,
    pub solar_radiation: f64,
    pub vapor_pressure: f64,
    pub humidity: f64,
    pub wind_direction: f64,
}

/// Candidate reading as submitted by a sensor. Every field is required;
/// aliases accept the legacy display-label keys.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadingInput {
    #[serde(alias = "Device Name")]
    pub device_name: String,
    #[serde(alias = "Precipitation mm/h")]
    pub precipitation: f64,
    #[serde(alias = "Time", deserialize_with = "crate::dates::deserialize_flexible")]
    pub time: DateTime<Utc>,
    #[serde(alias = "Latitude")]
    pub latitude: f64,
    #[serde(alias = "Longitude")]
    pub longitude: f64,
    #[serde(alias = "Temperature (°C)")]
    pub temperature: f64,
    #[serde(alias = "Atmospheric Pressure (kPa)")]
    pub atmospheric_pressure: f64,
    #[serde(alias = "Max Wind Speed (m/s)")]
    pub max_wind_speed: f64,
    #[serde(alias = "Solar Radiation (W/m2)")]
    pub solar_radiation: f64,
    #[serde(alias = "Vapor Pressure (kPa)")]
    pub vapor_pressure: f64,
    #[serde(alias = "Humidity (%)")]
    pub humidity: f64,
    #[serde(alias = "Wind Direction (°)")]
    pub wind_direction: f64,
}

impl ReadingInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.device_name.trim().is_empty() {
            return Err(ValidationError::new("device_name", "Device name is required"));
        }
        check_range("temperature", self.temperature, TEMPERATURE_RANGE)?;
        check_range("humidity", self.humidity, HUMIDITY_RANGE)?;
        Ok(())
    }
}

/// Partial update for a stored reading. Only whitelisted columns appear.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ReadingUpdate {
    #[serde(alias = "Device Name")]
    pub device_name: Option<String>,
    #[serde(alias = "Precipitation mm/h")]
    pub precipitation: Option<f64>,
    #[serde(
        alias = "Time",
        default,
        deserialize_with = "deserialize_flexible_opt"
    )]
    pub time: Option<DateTime<Utc>>,
    #[serde(alias = "Latitude")]
    pub latitude: Option<f64>,
    #[serde(alias = "Longitude")]
    pub longitude: Option<f64>,
    #[serde(alias = "Temperature (°C)")]
    pub temperature: Option<f64>,
    #[serde(alias = "Atmospheric Pressure (kPa)")]
    pub atmospheric_pressure: Option<f64>,
    #[serde(alias = "Max Wind Speed (m/s)")]
    pub max_wind_speed: Option<f64>,
    #[serde(alias = "Solar Radiation (W/m2)")]
    pub solar_radiation: Option<f64>,
    #[serde(alias = "Vapor Pressure (kPa)")]
    pub vapor_pressure: Option<f64>,
    #[serde(alias = "Humidity (%)")]
    pub humidity: Option<f64>,
    #[serde(alias = "Wind Direction (°)")]
    pub wind_direction: Option<f64>,
}

impl ReadingUpdate {
    pub fn is_empty(&self) -> bool {
        self.device_name.is_none()
            && self.precipitation.is_none()
            && self.time.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.temperature.is_none()
            && self.atmospheric_pressure.is_none()
            && self.max_wind_speed.is_none()
            && self.solar_radiation.is_none()
            && self.vapor_pressure.is_none()
            && self.humidity.is_none()
            && self.wind_direction.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.device_name {
            if name.trim().is_empty() {
                return Err(ValidationError::new("device_name", "Device name is required"));
            }
        }
        if let Some(t) = self.temperature {
            check_range("temperature", t, TEMPERATURE_RANGE)?;
        }
        if let Some(h) = self.humidity {
            check_range("humidity", h, HUMIDITY_RANGE)?;
        }
        Ok(())
    }
}

fn check_range(field: &'static str, value: f64, range: (f64, f64)) -> Result<(), ValidationError> {
    if !value.is_finite() || value < range.0 || value > range.1 {
        return Err(ValidationError::new(
            field,
            format!("{} must be between {} and {}", field, range.0, range.1),
        ));
    }
    Ok(())
}

fn deserialize_flexible_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    crate::dates::deserialize_flexible(deserializer).map(Some)
}

// Query projections

/// Trailing-window maximum precipitation result.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MaxPrecipitationRecord {
    pub device_name: String,
    pub precipitation: f64,
    pub time: DateTime<Utc>,
}

/// Range-wide maximum temperature result.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MaxTemperatureRecord {
    pub device_name: String,
    pub time: DateTime<Utc>,
    pub temperature: f64,
}

/// Fixed subset returned by the exact station + timestamp lookup.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StationSnapshot {
    pub device_name: String,
    pub temperature: f64,
    pub atmospheric_pressure: f64,
    pub solar_radiation: f64,
    pub precipitation: f64,
    pub vapor_pressure: f64,
    pub humidity: f64,
    pub max_wind_speed: f64,
    pub wind_direction: f64,
    pub time: DateTime<Utc>,
}

/// Row shape for the capped humidity/precipitation range scan.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RangeScanRow {
    pub device_name: String,
    pub temperature: f64,
    pub humidity: f64,
    pub precipitation: f64,
    pub time: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn canonical_payload() -> serde_json::Value {
        json!({
            "device_name": "sensor-a",
            "precipitation": 0.2,
            "time": "2024-03-01T10:30:00Z",
            "latitude": -33.8,
            "longitude": 151.2,
            "temperature": 22.5,
            "atmospheric_pressure": 101.3,
            "max_wind_speed": 4.2,
            "solar_radiation": 600.0,
            "vapor_pressure": 1.9,
            "humidity": 71.0,
            "wind_direction": 120.0
        })
    }

    #[test]
    fn accepts_canonical_keys() {
        let input: ReadingInput = serde_json::from_value(canonical_payload()).unwrap();
        assert_eq!(input.device_name, "sensor-a");
        assert!(input.validate().is_ok());
    }

    #[test]
    fn accepts_legacy_display_labels() {
        let input: ReadingInput = serde_json::from_value(json!({
            "Device Name": "sensor-b",
            "Precipitation mm/h": 0.0,
            "Time": "2021-01-07 01:55:22",
            "Latitude": 0.0,
            "Longitude": 0.0,
            "Temperature (°C)": 18.1,
            "Atmospheric Pressure (kPa)": 100.9,
            "Max Wind Speed (m/s)": 2.0,
            "Solar Radiation (W/m2)": 0.0,
            "Vapor Pressure (kPa)": 1.5,
            "Humidity (%)": 50.0,
            "Wind Direction (°)": 270.0
        }))
        .unwrap();
        assert_eq!(input.device_name, "sensor-b");
        assert!(input.validate().is_ok());
    }

    #[test]
    fn missing_field_fails_deserialization() {
        let mut payload = canonical_payload();
        payload.as_object_mut().unwrap().remove("humidity");
        assert!(serde_json::from_value::<ReadingInput>(payload).is_err());
    }

    #[test]
    fn rejects_out_of_range_temperature() {
        let mut payload = canonical_payload();
        payload["temperature"] = json!(75.0);
        let input: ReadingInput = serde_json::from_value(payload).unwrap();
        assert_eq!(input.validate().unwrap_err().field, "temperature");
    }

    #[test]
    fn rejects_out_of_range_humidity() {
        let mut payload = canonical_payload();
        payload["humidity"] = json!(150.0);
        let input: ReadingInput = serde_json::from_value(payload).unwrap();
        assert_eq!(input.validate().unwrap_err().field, "humidity");
    }

    #[test]
    fn boundary_values_are_accepted() {
        let mut payload = canonical_payload();
        payload["temperature"] = json!(-50.0);
        payload["humidity"] = json!(100.0);
        let input: ReadingInput = serde_json::from_value(payload).unwrap();
        assert!(input.validate().is_ok());
    }

    #[test]
    fn update_validates_present_fields_only() {
        let update: ReadingUpdate =
            serde_json::from_value(json!({ "Precipitation mm/h": 3.5 })).unwrap();
        assert!(!update.is_empty());
        assert!(update.validate().is_ok());

        let bad: ReadingUpdate = serde_json::from_value(json!({ "humidity": -1.0 })).unwrap();
        assert_eq!(bad.validate().unwrap_err().field, "humidity");

        let empty: ReadingUpdate = serde_json::from_value(json!({})).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn every_field_has_column_and_label() {
        for field in ReadingField::ALL {
            assert!(!field.column().is_empty());
            assert!(!field.label().is_empty());
        }
        assert_eq!(ReadingField::Temperature.column(), "temperature");
        assert_eq!(ReadingField::Temperature.label(), "Temperature (°C)");
    }
}
