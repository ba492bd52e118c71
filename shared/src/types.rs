//! Common types used across the platform

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Canonical calendar date format on every API boundary
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date.
///
/// Only the zero-padded ten-character form is accepted, so `2025-1-5` and
/// `01-10-2025` are both rejected instead of being guessed at.
pub fn parse_iso_date(value: &str) -> Result<NaiveDate, &'static str> {
    let bytes = value.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shaped {
        return Err("Date must be in YYYY-MM-DD format");
    }

    NaiveDate::parse_from_str(value, ISO_DATE_FORMAT).map_err(|_| "Date is not a valid calendar date")
}

pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

/// Serde adapter for `NaiveDate` fields that must use the strict format
pub mod iso_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_iso_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_iso_date(&raw).map_err(de::Error::custom)
    }
}

/// Polygon vertex of a mapped field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Envelope used by list and mutation endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(
            parse_iso_date("2025-10-01"),
            Ok(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap())
        );
        assert_eq!(
            parse_iso_date("2024-02-29"),
            Ok(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );
    }

    #[test]
    fn test_parse_iso_date_rejects_other_shapes() {
        assert!(parse_iso_date("01-10-2025").is_err());
        assert!(parse_iso_date("2025-1-5").is_err());
        assert!(parse_iso_date("2025/10/01").is_err());
        assert!(parse_iso_date("2025-10-01T00:00:00").is_err());
        assert!(parse_iso_date("").is_err());
        assert!(parse_iso_date("2025-02-30").is_err());
        assert!(parse_iso_date("+2025-10-0").is_err());
    }

    #[test]
    fn test_iso_date_serde() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            #[serde(with = "iso_date")]
            date: NaiveDate,
        }

        let parsed: Wrapper = serde_json::from_str(r#"{"date":"2025-10-01"}"#).unwrap();
        assert_eq!(serde_json::to_string(&parsed).unwrap(), r#"{"date":"2025-10-01"}"#);
        assert!(serde_json::from_str::<Wrapper>(r#"{"date":"01-10-2025"}"#).is_err());
    }
}
