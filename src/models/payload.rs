//! Outbound request bodies and the generic acknowledgement.

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

use super::{AuthCredentials, AuthMode, InstanceId};

/// Full instance body for `POST /instances` (and full `PUT`).
///
/// Credentials are typed so the `auth_mode`/`auth_data` pair on the wire is
/// always consistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstancePayload {
    pub name: String,
    pub description: Option<String>,
    /// Provider kind id
    pub provider: Option<String>,
    pub endpoint: String,
    pub enabled: bool,
    credentials: AuthCredentials,
}

impl InstancePayload {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        credentials: AuthCredentials,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            provider: None,
            endpoint: endpoint.into(),
            enabled: true,
            credentials,
        }
    }

    pub fn with_provider(mut self, kind: impl Into<String>) -> Self {
        self.provider = Some(kind.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = (!description.is_empty()).then_some(description);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn credentials(&self) -> &AuthCredentials {
        &self.credentials
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.credentials.mode()
    }
}

#[derive(Serialize)]
struct WirePayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth_mode: Option<AuthMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth_data: Option<BTreeMap<String, String>>,
}

impl Serialize for InstancePayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WirePayload {
            name: Some(&self.name),
            description: self.description.as_deref(),
            provider: self.provider.as_deref(),
            endpoint: Some(&self.endpoint),
            enabled: Some(self.enabled),
            auth_mode: Some(self.credentials.mode()),
            auth_data: Some(self.credentials.to_data()),
        }
        .serialize(serializer)
    }
}

/// Partial body for `PUT /instances/{id}`; only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstancePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub provider: Option<String>,
    pub endpoint: Option<String>,
    pub enabled: Option<bool>,
    pub credentials: Option<AuthCredentials>,
}

impl InstancePatch {
    /// `{"enabled": <flag>}` and nothing else.
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<&InstancePayload> for InstancePatch {
    fn from(payload: &InstancePayload) -> Self {
        Self {
            name: Some(payload.name.clone()),
            description: payload.description.clone(),
            provider: payload.provider.clone(),
            endpoint: Some(payload.endpoint.clone()),
            enabled: Some(payload.enabled),
            credentials: Some(payload.credentials.clone()),
        }
    }
}

impl Serialize for InstancePatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WirePayload {
            name: self.name.as_deref(),
            description: self.description.as_deref(),
            provider: self.provider.as_deref(),
            endpoint: self.endpoint.as_deref(),
            enabled: self.enabled,
            auth_mode: self.credentials.as_ref().map(AuthCredentials::mode),
            auth_data: self.credentials.as_ref().map(AuthCredentials::to_data),
        }
        .serialize(serializer)
    }
}

/// Body for `POST /preheats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreheatRequest {
    pub images: Vec<String>,
}

/// Successful response to a mutation: the status code plus whatever JSON the
/// backend echoed (`{"updated": id}`, `{"removed": id}`, a map of preheat
/// tasks), if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Ack {
    pub status: u16,
    pub body: Option<Value>,
}

impl Ack {
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.body.as_ref().and_then(|body| body.get(key))
    }

    /// The instance id the backend echoed back, under any of its usual keys.
    pub fn echoed_id(&self) -> Option<InstanceId> {
        ["id", "ID", "updated", "removed"]
            .iter()
            .find_map(|key| self.field(key))
            .and_then(|value| match value {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }
}
