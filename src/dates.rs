//! Tolerant timestamp parsing for query parameters and request bodies.
//!
//! Clients send anything from a bare calendar date to a full RFC 3339
//! timestamp; all of them resolve to UTC instants.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unrecognized date/time value: {0}")]
pub struct DateParseError(pub String);

/// Parse a client-supplied date or timestamp string.
///
/// Accepted forms, tried in order: RFC 3339, `YYYY-MM-DDTHH:MM:SS`,
/// `YYYY-MM-DD HH:MM:SS` (both read as UTC), and `YYYY-MM-DD` (midnight UTC).
/// Surrounding whitespace is ignored.
pub fn parse_flexible(input: &str) -> Result<DateTime<Utc>, DateParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DateParseError(input.to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(DateParseError(trimmed.to_string()))
}

/// Serde helper so reading payloads accept the same flexible formats.
pub fn deserialize_flexible<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flexible(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_rfc3339() {
        let parsed = parse_flexible("2021-01-07T01:55:22Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2021, 1, 7, 1, 55, 22).unwrap());
    }

    #[test]
    fn parses_naive_timestamp_as_utc() {
        let parsed = parse_flexible("2021-01-07 01:55:22").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2021, 1, 7, 1, 55, 22).unwrap());
    }

    #[test]
    fn parses_bare_date_at_midnight() {
        let parsed = parse_flexible("2021-01-07").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2021, 1, 7, 0, 0, 0).unwrap());
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let parsed = parse_flexible("  2021-01-07T01:55:22Z\n").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2021, 1, 7, 1, 55, 22).unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_flexible("next tuesday").is_err());
        assert!(parse_flexible("").is_err());
        assert!(parse_flexible("2021-13-40").is_err());
    }
}
