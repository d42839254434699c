// Local date-times travel as `2025-03-01T09:00:00`. Forms also send a bare
// date or minute precision, so parsing is lenient.
use chrono::{NaiveDate, NaiveDateTime};
use serde::{de, Deserialize, Deserializer, Serializer};

const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse a local date-time, accepting `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM`
/// and `YYYY-MM-DDTHH:MM:SS[.fff]`.
pub fn parse_local(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Format the way the backend echoes date-times back
pub fn format_local(dt: &NaiveDateTime) -> String {
    dt.format(FORMAT).to_string()
}

/// Join a form's date and time fields into `{date}T{time}:00`
pub fn join_date_time(date: &str, time: &str) -> String {
    format!("{}T{}:00", date.trim(), time.trim())
}

// a single-purpose module for use in `#[serde(with)]` on optional fields
pub mod optional {
    use super::*;

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&format_local(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => parse_local(&s)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid date-time: {}", s))),
        }
    }
}
