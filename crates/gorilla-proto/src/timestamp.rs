//! Serde helpers for UTC timestamps on the wire.
//!
//! The peer emits RFC 3339 strings. Absent, `null` and empty strings all
//! decode to `None`; validation decides whether that is acceptable.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};

/// Format a timestamp the way it is written to the wire.
#[must_use]
pub fn format(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|ts| ts.with_timezone(&Utc))
}

/// Whether a timestamp counts as unset.
///
/// Anything at or before the Unix epoch is treated as a default value from
/// the peer (e.g. `0001-01-01T00:00:00Z`).
#[must_use]
pub fn is_unset(value: Option<&DateTime<Utc>>) -> bool {
    value.map_or(true, |ts| ts.timestamp() <= 0)
}

pub fn serialize<S: Serializer>(
    value: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(ts) => serializer.serialize_str(&format(ts)),
        None => serializer.serialize_none(),
    }
}

pub fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse(s).map(Some).map_err(D::Error::custom),
    }
}

/// Non-optional variant for documents that always carry a timestamp.
pub mod required {
    use chrono::{DateTime, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let ts = super::parse(raw.trim()).map_err(D::Error::custom)?;
        if super::is_unset(Some(&ts)) {
            return Err(D::Error::custom("timestamp is unset"));
        }
        Ok(ts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_offset_and_normalizes_to_utc() {
        let ts = parse("2026-02-14T19:10:00+01:00").unwrap();
        assert_eq!(format(&ts), "2026-02-14T18:10:00Z");
    }

    #[test]
    fn test_format_keeps_subsecond_precision() {
        let ts = parse("2026-02-14T18:10:00.123456Z").unwrap();
        assert_eq!(format(&ts), "2026-02-14T18:10:00.123456Z");
    }

    #[test]
    fn test_is_unset() {
        assert!(is_unset(None));
        assert!(is_unset(Some(&parse("0001-01-01T00:00:00Z").unwrap())));
        assert!(is_unset(Some(&parse("1970-01-01T00:00:00Z").unwrap())));
        assert!(!is_unset(Some(&parse("2026-02-14T18:10:00Z").unwrap())));
    }
}
