//! Serde adapter for the local timestamps stored in the CSV tables.
//!
//! Written as `2024-05-01 13:45:10.123456`; read back in that form or in
//! the ISO-8601 `T`-separated form, with or without fractional seconds.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serializer};

pub const WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

const READ_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

pub fn format(ts: &NaiveDateTime) -> String {
    ts.format(WRITE_FORMAT).to_string()
}

pub fn parse(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    READ_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(ts))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_format_has_microseconds() {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_micro_opt(13, 45, 10, 123456)
            .unwrap();
        assert_eq!(format(&ts), "2024-05-01 13:45:10.123456");
        assert_eq!(parse(&format(&ts)), Some(ts));
    }

    #[test]
    fn test_parse_accepts_iso_and_whole_seconds() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(13, 45, 10)
            .unwrap();
        assert_eq!(parse("2024-05-01T13:45:10"), Some(expected));
        assert_eq!(parse("2024-05-01 13:45:10"), Some(expected));
        assert_eq!(parse("yesterday"), None);
    }
}
