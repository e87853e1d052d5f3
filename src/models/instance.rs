use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use super::{
    deserialize_id, deserialize_nullable, deserialize_timestamp, AuthCredentials, AuthMode,
    DistributionProvider, InstanceId,
};
use crate::error::ValidationError;

/// Status reported by the backend for a reachable instance.
pub const STATUS_HEALTHY: &str = "Healthy";
/// Status reported by the backend for an unreachable instance.
pub const STATUS_UNHEALTHY: &str = "Unhealthy";

/// How an instance refers to its provider kind.
///
/// Older payloads embed the whole driver metadata, newer ones send only its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderRef {
    Embedded(DistributionProvider),
    Kind(String),
}

impl ProviderRef {
    pub fn kind_id(&self) -> &str {
        match self {
            ProviderRef::Embedded(provider) => provider.kind_id(),
            ProviderRef::Kind(id) => id,
        }
    }

    pub fn embedded(&self) -> Option<&DistributionProvider> {
        match self {
            ProviderRef::Embedded(provider) => Some(provider),
            ProviderRef::Kind(_) => None,
        }
    }
}

/// A configured deployment of a provider.
///
/// Always deserialized as a whole from the backend; the local copy is never
/// patched field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireInstance")]
pub struct ProviderInstance {
    pub id: InstanceId,
    pub name: String,
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Advisory health string, e.g. "Healthy"
    pub status: String,
    pub enabled: bool,
    #[serde(serialize_with = "chrono::serde::ts_seconds_option::serialize")]
    pub setup_timestamp: Option<DateTime<Utc>>,
    pub provider: Option<ProviderRef>,
    pub auth_mode: AuthMode,
    pub auth_data: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, String>,
}

impl ProviderInstance {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case(STATUS_HEALTHY)
    }

    pub fn provider_kind(&self) -> Option<&str> {
        self.provider.as_ref().map(ProviderRef::kind_id)
    }

    /// Typed credentials, failing when `auth_data` does not fit `auth_mode`.
    pub fn credentials(&self) -> Result<AuthCredentials, ValidationError> {
        AuthCredentials::from_parts(self.auth_mode, &self.auth_data)
    }

    /// Lowercased text searched by keyword filters.
    pub(crate) fn matches_keyword(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [
            self.name.as_str(),
            self.endpoint.as_str(),
            self.description.as_deref().unwrap_or_default(),
            self.provider_kind().unwrap_or_default(),
            self.status.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Nested credential block used by the web UI model.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireAuthorization {
    #[serde(alias = "authMode", deserialize_with = "lenient_auth_mode")]
    auth_mode: Option<AuthMode>,
    #[serde(alias = "authData", alias = "data", deserialize_with = "deserialize_nullable")]
    data: BTreeMap<String, String>,
}

/// Every spelling an instance arrives in.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireInstance {
    #[serde(alias = "ID", deserialize_with = "deserialize_id")]
    id: String,
    #[serde(alias = "Name", deserialize_with = "deserialize_nullable")]
    name: String,
    #[serde(alias = "Endpoint", deserialize_with = "deserialize_nullable")]
    endpoint: String,
    #[serde(alias = "Description")]
    description: Option<String>,
    #[serde(alias = "Status", deserialize_with = "deserialize_nullable")]
    status: String,
    #[serde(alias = "Enabled", deserialize_with = "deserialize_nullable")]
    enabled: bool,
    #[serde(
        alias = "setupTimestamp",
        alias = "SetupTimestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    setup_timestamp: Option<DateTime<Utc>>,
    #[serde(alias = "Provider")]
    provider: Option<ProviderRef>,
    #[serde(alias = "authMode", alias = "AuthMode", deserialize_with = "lenient_auth_mode")]
    auth_mode: Option<AuthMode>,
    #[serde(alias = "authData", alias = "AuthData", deserialize_with = "deserialize_nullable")]
    auth_data: BTreeMap<String, String>,
    authorization: Option<WireAuthorization>,
    #[serde(alias = "Extensions", deserialize_with = "deserialize_nullable")]
    extensions: BTreeMap<String, String>,
}

impl From<WireInstance> for ProviderInstance {
    fn from(wire: WireInstance) -> Self {
        let (auth_mode, auth_data) = match wire.authorization {
            Some(auth) if auth.auth_mode.is_some() || !auth.data.is_empty() => {
                (auth.auth_mode.or(wire.auth_mode), auth.data)
            }
            _ => (wire.auth_mode, wire.auth_data),
        };

        ProviderInstance {
            id: wire.id,
            name: wire.name,
            endpoint: wire.endpoint,
            description: wire.description.filter(|d| !d.is_empty()),
            status: wire.status,
            enabled: wire.enabled,
            setup_timestamp: wire.setup_timestamp,
            provider: wire.provider.filter(|p| !p.kind_id().is_empty()),
            auth_mode: auth_mode.unwrap_or_default(),
            auth_data,
            extensions: wire.extensions,
        }
    }
}

/// Unknown modes from the backend degrade to `None` instead of failing the
/// whole list.
fn lenient_auth_mode<'de, D>(deserializer: D) -> Result<Option<AuthMode>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value.parse::<AuthMode>() {
        Ok(mode) => Some(mode),
        Err(err) => {
            tracing::warn!(error = %err, "Ignoring auth mode from backend");
            None
        }
    }))
}
