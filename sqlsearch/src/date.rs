//! Date format conversion
//!
//! Dates are stored in a single canonical form, UTC RFC 3339 text with
//! whole-second precision (`2022-11-11T13:31:29Z`). Clients send and expect
//! dates in one of a small set of named external formats; anything else is
//! passed through untouched.

use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Format assumed for range bounds that do not declare one.
pub const DEFAULT_RANGE_FORMAT: &str = "epoch_millis";

/// An external date format, as named in templates and range queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateFormat {
    /// Milliseconds since the Unix epoch
    EpochMillis,
    /// Seconds since the Unix epoch
    EpochSecond,
    /// Any format we do not convert; values pass through unchanged
    Passthrough(String),
}

impl DateFormat {
    /// Resolve a format name. Never fails: unknown names become
    /// [`DateFormat::Passthrough`], which converts nothing.
    pub fn from_name(name: &str) -> Self {
        match name {
            "epoch_millis" => Self::EpochMillis,
            "epoch_second" => Self::EpochSecond,
            other => Self::Passthrough(other.to_string()),
        }
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self, Self::Passthrough(_))
    }

    /// Convert an external value to canonical text.
    ///
    /// Integers, floats and base-10 numeral strings are accepted. For
    /// [`DateFormat::Passthrough`] the value is returned as-is.
    pub fn to_canonical(&self, value: &Value) -> Result<Value> {
        let unit_count = match self {
            Self::Passthrough(_) => return Ok(value.clone()),
            Self::EpochMillis | Self::EpochSecond => epoch_count(self, value)?,
        };

        let instant = match self {
            Self::EpochMillis => DateTime::<Utc>::from_timestamp_millis(unit_count),
            _ => DateTime::<Utc>::from_timestamp(unit_count, 0),
        }
        .ok_or_else(|| {
            Error::Format(format!(
                "{} is out of range for format {}",
                unit_count,
                self.name()
            ))
        })?;

        Ok(Value::String(
            instant.to_rfc3339_opts(SecondsFormat::Secs, true),
        ))
    }

    /// Convert canonical text back to the external representation.
    pub fn from_canonical(&self, canonical: &str) -> Result<Value> {
        if let Self::Passthrough(_) = self {
            return Ok(Value::String(canonical.to_string()));
        }

        let instant = DateTime::parse_from_rfc3339(canonical).map_err(|e| {
            Error::Format(format!(
                "stored value '{}' is not a canonical timestamp: {}",
                canonical, e
            ))
        })?;

        Ok(match self {
            Self::EpochMillis => Value::from(instant.timestamp_millis()),
            _ => Value::from(instant.timestamp()),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Self::EpochMillis => "epoch_millis",
            Self::EpochSecond => "epoch_second",
            Self::Passthrough(name) => name,
        }
    }
}

/// Shorthand for `DateFormat::from_name(format).to_canonical(value)`.
pub fn to_canonical(format: &str, value: &Value) -> Result<Value> {
    DateFormat::from_name(format).to_canonical(value)
}

/// Shorthand for `DateFormat::from_name(format).from_canonical(canonical)`.
pub fn from_canonical(format: &str, canonical: &str) -> Result<Value> {
    DateFormat::from_name(format).from_canonical(canonical)
}

fn epoch_count(format: &DateFormat, value: &Value) -> Result<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else if let Some(f) = n.as_f64().filter(|f| f.is_finite()) {
                // Fractional units are truncated toward zero
                Ok(f as i64)
            } else {
                Err(Error::Format(format!(
                    "{} cannot be read as {}",
                    n,
                    format.name()
                )))
            }
        }
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| {
            Error::Format(format!(
                "couldn't parse value '{}' to format {}",
                s,
                format.name()
            ))
        }),
        other => Err(Error::Format(format!(
            "expected a number or numeral string for format {}, got {}",
            format.name(),
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FIXTURE_MILLIS: i64 = 1668173489840;
    const FIXTURE_TEXT: &str = "2022-11-11T13:31:29Z";

    #[test]
    fn test_epoch_millis_integer() {
        let v = to_canonical("epoch_millis", &json!(FIXTURE_MILLIS)).unwrap();
        assert_eq!(v, json!(FIXTURE_TEXT));
    }

    #[test]
    fn test_epoch_millis_float() {
        let v = to_canonical("epoch_millis", &json!(1668173489840.0)).unwrap();
        assert_eq!(v, json!(FIXTURE_TEXT));
    }

    #[test]
    fn test_epoch_millis_string() {
        let v = to_canonical("epoch_millis", &json!("1668173489840")).unwrap();
        assert_eq!(v, json!(FIXTURE_TEXT));
    }

    #[test]
    fn test_epoch_second_matches_scaled_millis() {
        let secs = 1668173489_i64;
        let a = to_canonical("epoch_second", &json!(secs)).unwrap();
        let b = to_canonical("epoch_millis", &json!(secs * 1000)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_negative_millis_floor() {
        let v = to_canonical("epoch_millis", &json!(-1)).unwrap();
        assert_eq!(v, json!("1969-12-31T23:59:59Z"));
    }

    #[test]
    fn test_bad_numeral_string() {
        let err = to_canonical("epoch_millis", &json!("yesterday")).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_non_scalar_rejected() {
        let err = to_canonical("epoch_second", &json!({"a": 1})).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
        let err = to_canonical("epoch_second", &json!(true)).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_unknown_format_is_identity() {
        let value = json!("2024-01-01");
        assert_eq!(
            to_canonical("strict_date_optional_time", &value).unwrap(),
            value
        );
        assert_eq!(
            from_canonical("yyyy-MM-dd", "2024-01-01").unwrap(),
            json!("2024-01-01")
        );
        assert!(DateFormat::from_name("whatever").is_passthrough());
    }

    #[test]
    fn test_from_canonical_millis() {
        let v = from_canonical("epoch_millis", FIXTURE_TEXT).unwrap();
        assert_eq!(v, json!(1668173489000_i64));
    }

    #[test]
    fn test_from_canonical_second() {
        let v = from_canonical("epoch_second", FIXTURE_TEXT).unwrap();
        assert_eq!(v, json!(1668173489_i64));
    }

    #[test]
    fn test_from_canonical_malformed() {
        let err = from_canonical("epoch_millis", "11/11/2022").unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }
}
