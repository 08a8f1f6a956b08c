use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Camera, tag, config and detection identifiers are opaque strings.
pub type EntityId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Naive formats accepted when a timestamp carries no offset.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an RFC 3339 timestamp, or an offset-free one read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// `deserialize_with` helper for remote timestamps. Serialization stays
/// RFC 3339 with an explicit offset.
pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn noon() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn rfc3339_with_offset_is_normalized_to_utc() {
        assert_eq!(parse_timestamp("2024-03-01T14:00:00+02:00"), Some(noon()));
        assert_eq!(parse_timestamp("2024-03-01T12:00:00Z"), Some(noon()));
    }

    #[test]
    fn offset_free_values_are_read_as_utc() {
        assert_eq!(parse_timestamp("2024-03-01T12:00:00"), Some(noon()));
        assert_eq!(parse_timestamp("2024-03-01 12:00:00"), Some(noon()));
        assert_eq!(
            parse_timestamp("2024-03-01T12:00:00.250000"),
            Some(noon() + chrono::Duration::milliseconds(250))
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp(""), None);
    }
}
