//! Heart Rate Model
//!
//! Heart rate samples and the timestamp parsing rules applied to incoming
//! measurements.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// A stored heart rate sample
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct HeartRateRecord {
    /// Client-supplied or generated identifier (globally unique)
    pub id: String,

    /// Owner of the sample
    pub user_id: i64,

    /// Beats per minute
    pub bpm: i32,

    /// When the sample was measured, in UTC
    pub recorded_at: DateTime<Utc>,

    /// When the server stored the sample
    pub created_at: DateTime<Utc>,
}

/// Sample about to be inserted
#[derive(Debug, Clone)]
pub struct NewHeartRate {
    pub id: String,
    pub user_id: i64,
    pub bpm: i32,
    pub recorded_at: DateTime<Utc>,
}

/// Heart rate sample as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateResponse {
    pub id: String,
    pub bpm: i32,
    pub recorded_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<HeartRateRecord> for HeartRateResponse {
    fn from(record: HeartRateRecord) -> Self {
        Self {
            id: record.id,
            bpm: record.bpm,
            recorded_at: record.recorded_at,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimestampError {
    #[error("invalid datetime format: {0:?}")]
    Format(String),

    #[error("timestamp out of range")]
    OutOfRange,
}

/// Layouts carrying an offset without a colon (`+0200`)
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Naive layouts accepted when the client sends no offset
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Numbers above this magnitude are Unix milliseconds rather than seconds
const MILLISECONDS_THRESHOLD: f64 = 2e10;

/// Parse a measurement timestamp and normalize it to UTC.
///
/// Offsets are honored; naive date-times are taken to already be UTC and a
/// bare date means midnight UTC. Numeric strings are Unix timestamps.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, TimestampError> {
    let input = input.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Ok(parsed.with_timezone(&Utc));
    }

    if let Some(parsed) = OFFSET_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(input, format).ok())
    {
        return Ok(parsed.with_timezone(&Utc));
    }

    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
    {
        return Ok(naive.and_utc());
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }

    match input.parse::<f64>() {
        Ok(number) if is_numeric_literal(input) => timestamp_from_unix(number),
        _ => Err(TimestampError::Format(input.to_string())),
    }
}

/// Only plain decimal numbers count, not `inf` or `NaN`
fn is_numeric_literal(input: &str) -> bool {
    let digits = input.strip_prefix(['-', '+']).unwrap_or(input);
    !digits.is_empty()
        && digits.chars().any(|c| c.is_ascii_digit())
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// Convert a Unix timestamp into UTC.
///
/// Magnitudes above 2e10 are read as milliseconds, so `Date.now()` style
/// values land in the right century.
pub fn timestamp_from_unix(value: f64) -> Result<DateTime<Utc>, TimestampError> {
    if value.abs() > MILLISECONDS_THRESHOLD {
        timestamp_from_unix_seconds(value / 1000.0)
    } else {
        timestamp_from_unix_seconds(value)
    }
}

/// Convert fractional Unix seconds into a UTC timestamp
pub fn timestamp_from_unix_seconds(seconds: f64) -> Result<DateTime<Utc>, TimestampError> {
    if !seconds.is_finite() {
        return Err(TimestampError::OutOfRange);
    }

    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1_000_000_000.0).round().min(999_999_999.0) as u32;
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return Err(TimestampError::OutOfRange);
    }

    DateTime::from_timestamp(whole as i64, nanos).ok_or(TimestampError::OutOfRange)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Seconds(f64),
}

/// Serde adapter for `recorded_at` accepting strings or Unix timestamps
pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Text(text) => parse_timestamp(&text).map_err(de::Error::custom),
        RawTimestamp::Seconds(seconds) => timestamp_from_unix(seconds).map_err(de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_offset_timestamps_are_converted_to_utc() {
        let parsed = parse_timestamp("2024-03-10T08:30:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 10, 6, 30, 0).unwrap());

        let zulu = parse_timestamp("2024-03-10T08:30:00.250Z").unwrap();
        assert_eq!(zulu.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_naive_timestamps_are_treated_as_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 10, 8, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-10T08:30:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-10 08:30:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-10T08:30").unwrap(), expected);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(TimestampError::Format(_))
        ));
        assert!(parse_timestamp("").is_err());
    }

    #[test]
    fn test_unix_seconds() {
        let parsed = timestamp_from_unix_seconds(1_700_000_000.5).unwrap();
        assert_eq!(parsed.timestamp(), 1_700_000_000);
        assert_eq!(parsed.timestamp_subsec_millis(), 500);
        assert_eq!(
            timestamp_from_unix_seconds(f64::NAN),
            Err(TimestampError::OutOfRange)
        );
    }

    #[test]
    fn test_offsets_without_colon() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-01T10:00:00+0200").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-01-01 10:00:00.000+0200").unwrap(), expected);
    }

    #[test]
    fn test_date_only_is_midnight_utc() {
        assert_eq!(
            parse_timestamp("2024-01-01").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_numeric_strings_are_unix_timestamps() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("1704067200").unwrap(), expected);
        assert_eq!(parse_timestamp(" 1704067200000 ").unwrap(), expected);
        assert!(parse_timestamp("inf").is_err());
        assert!(parse_timestamp("NaN").is_err());
        assert!(parse_timestamp("-").is_err());
    }

    #[test]
    fn test_large_numbers_are_milliseconds() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(timestamp_from_unix(1_704_067_200_000.0).unwrap(), expected);
        assert_eq!(timestamp_from_unix(1_704_067_200.0).unwrap(), expected);

        let millis = timestamp_from_unix(1_704_067_200_250.0).unwrap();
        assert_eq!(millis.timestamp_subsec_millis(), 250);
    }

    #[derive(Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "deserialize_timestamp")]
        at: DateTime<Utc>,
    }

    #[test]
    fn test_deserialize_accepts_strings_and_numbers() {
        let text: Sample = serde_json::from_str(r#"{"at":"2024-01-01T00:00:00Z"}"#).unwrap();
        let number: Sample = serde_json::from_str(r#"{"at":1704067200}"#).unwrap();
        let millis: Sample = serde_json::from_str(r#"{"at":1704067200000}"#).unwrap();
        assert_eq!(text.at, number.at);
        assert_eq!(text.at, millis.at);

        assert!(serde_json::from_str::<Sample>(r#"{"at":"not a date"}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"at":true}"#).is_err());
    }

    #[test]
    fn test_response_serializes_utc() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let response = HeartRateResponse {
            id: "abc".to_string(),
            bpm: 72,
            recorded_at: at,
            created_at: at,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["recorded_at"], "2024-01-01T12:00:00Z");
        assert_eq!(json["bpm"], 72);
    }
}
