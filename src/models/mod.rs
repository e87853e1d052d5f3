//! Wire and domain types for the distribution API.
//!
//! The backend emits Go-style field names (`ID`, `Endpoint`, `auth_mode`),
//! older UI payloads use camelCase (`authMode`, `setupTimestamp`). Every
//! inbound type accepts all of these; outbound types serialize snake_case.

mod auth;
mod history;
mod instance;
mod payload;
mod provider;

pub use auth::{AuthCredentials, AuthMode};
pub use history::{DistributionHistory, PreheatStatus};
pub use instance::{ProviderInstance, ProviderRef, STATUS_HEALTHY, STATUS_UNHEALTHY};
pub use payload::{Ack, InstancePatch, InstancePayload, PreheatRequest};
pub use provider::DistributionProvider;

/// Identifier assigned by the backend to an instance.
pub type InstanceId = String;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

/// Helper to deserialize id as either string or integer
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string, integer or null")
        }

        fn visit_str<E>(self, value: &str) -> Result<String, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_string<E>(self, value: String) -> Result<String, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_i64<E>(self, value: i64) -> Result<String, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<String, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_unit<E>(self) -> Result<String, E>
        where
            E: de::Error,
        {
            Ok(String::new())
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

/// Helper to deserialize nullable values (strings, lists, maps) as their default.
/// Go encodes nil slices and maps as `null`.
pub(crate) fn deserialize_nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(|opt| opt.unwrap_or_default())
}

/// Helper to deserialize a timestamp given as Unix seconds, Unix
/// milliseconds, or an RFC 3339 string. `0`, `""` and `null` mean "not set".
pub(crate) fn deserialize_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Seconds(i64),
        Float(f64),
        Text(String),
    }

    let raw = Option::<RawTimestamp>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(RawTimestamp::Seconds(0)) => Ok(None),
        Some(RawTimestamp::Seconds(secs)) => Ok(from_unix(secs)),
        Some(RawTimestamp::Float(secs)) => Ok(from_unix(secs as i64)),
        Some(RawTimestamp::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(RawTimestamp::Text(text)) => DateTime::parse_from_rfc3339(text.trim())
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|e| D::Error::custom(format!("invalid timestamp '{}': {}", text, e))),
    }
}

/// Values past year 9999 in seconds are taken to be milliseconds.
fn from_unix(value: i64) -> Option<DateTime<Utc>> {
    const MAX_SECONDS: i64 = 253_402_300_799;
    if value.abs() > MAX_SECONDS {
        Utc.timestamp_millis_opt(value).single()
    } else {
        Utc.timestamp_opt(value, 0).single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Wire {
        #[serde(default, deserialize_with = "deserialize_id")]
        id: String,
        #[serde(default, deserialize_with = "deserialize_timestamp")]
        at: Option<DateTime<Utc>>,
        #[serde(default, deserialize_with = "deserialize_nullable")]
        tags: Vec<String>,
    }

    #[test]
    fn test_id_accepts_integer_and_null() {
        let p: Wire = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        assert_eq!(p.id, "42");
        let p: Wire = serde_json::from_str(r#"{"id": null}"#).unwrap();
        assert_eq!(p.id, "");
    }

    #[test]
    fn test_timestamp_forms() {
        let p: Wire = serde_json::from_str(r#"{"at": 1700000000}"#).unwrap();
        assert_eq!(p.at.unwrap().timestamp(), 1_700_000_000);

        let p: Wire = serde_json::from_str(r#"{"at": 1700000000123}"#).unwrap();
        assert_eq!(p.at.unwrap().timestamp(), 1_700_000_000);

        let p: Wire = serde_json::from_str(r#"{"at": "2024-05-01T10:00:00Z"}"#).unwrap();
        assert_eq!(p.at.unwrap().to_rfc3339(), "2024-05-01T10:00:00+00:00");

        let p: Wire = serde_json::from_str(r#"{"at": 0}"#).unwrap();
        assert!(p.at.is_none());
    }

    #[test]
    fn test_bad_timestamp_is_rejected() {
        let result: Result<Wire, _> = serde_json::from_str(r#"{"at": "yesterday"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_null_list_is_empty() {
        let p: Wire = serde_json::from_str(r#"{"tags": null}"#).unwrap();
        assert!(p.tags.is_empty());
    }
}
