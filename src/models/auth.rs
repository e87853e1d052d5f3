//! Credential schemes an instance uses to talk to its provider.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Key names required by BASIC.
const BASIC_KEYS: [&str; 2] = ["password", "username"];
/// Key name required by OAUTH.
const OAUTH_KEYS: [&str; 1] = ["token"];
/// Placeholder reported when a CUSTOM instance has no header at all.
const CUSTOM_PLACEHOLDER: &str = "header_key";

/// Authentication scheme of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AuthMode {
    #[default]
    None,
    Basic,
    OAuth,
    Custom,
}

impl AuthMode {
    /// Wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::None => "NONE",
            AuthMode::Basic => "BASIC",
            AuthMode::OAuth => "OAUTH",
            AuthMode::Custom => "CUSTOM",
        }
    }

    /// All modes in display order.
    pub fn all() -> [AuthMode; 4] {
        [AuthMode::None, AuthMode::Basic, AuthMode::OAuth, AuthMode::Custom]
    }

    /// Blank form fields for this mode. CUSTOM starts with no header because
    /// the header name is user supplied.
    pub fn form_template(&self) -> BTreeMap<String, String> {
        let keys: &[&str] = match self {
            AuthMode::None | AuthMode::Custom => &[],
            AuthMode::Basic => &BASIC_KEYS,
            AuthMode::OAuth => &OAUTH_KEYS,
        };
        keys.iter()
            .map(|k| (k.to_string(), String::new()))
            .collect()
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for AuthMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "" | "NONE" => Ok(AuthMode::None),
            "BASIC" => Ok(AuthMode::Basic),
            "OAUTH" => Ok(AuthMode::OAuth),
            "CUSTOM" => Ok(AuthMode::Custom),
            _ => Err(ValidationError::UnknownAuthMode(s.to_string())),
        }
    }
}

impl Serialize for AuthMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AuthMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Credentials for one auth mode, carrying exactly the fields that mode needs.
///
/// This is the only way to build an outbound payload, so a payload can never
/// carry BASIC fields under OAUTH.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthCredentials {
    None,
    Basic { username: String, password: String },
    OAuth { token: String },
    /// A single extra request header.
    Custom { header: String, value: String },
}

impl AuthCredentials {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        AuthCredentials::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn oauth(token: impl Into<String>) -> Self {
        AuthCredentials::OAuth {
            token: token.into(),
        }
    }

    pub fn custom(header: impl Into<String>, value: impl Into<String>) -> Self {
        AuthCredentials::Custom {
            header: header.into(),
            value: value.into(),
        }
    }

    /// The mode these credentials belong to.
    pub fn mode(&self) -> AuthMode {
        match self {
            AuthCredentials::None => AuthMode::None,
            AuthCredentials::Basic { .. } => AuthMode::Basic,
            AuthCredentials::OAuth { .. } => AuthMode::OAuth,
            AuthCredentials::Custom { .. } => AuthMode::Custom,
        }
    }

    /// Flatten into the `auth_data` map sent on the wire.
    pub fn to_data(&self) -> BTreeMap<String, String> {
        let mut data = BTreeMap::new();
        match self {
            AuthCredentials::None => {}
            AuthCredentials::Basic { username, password } => {
                data.insert("username".to_string(), username.clone());
                data.insert("password".to_string(), password.clone());
            }
            AuthCredentials::OAuth { token } => {
                data.insert("token".to_string(), token.clone());
            }
            AuthCredentials::Custom { header, value } => {
                data.insert(header.clone(), value.clone());
            }
        }
        data
    }

    /// Check a loosely typed `(mode, data)` pair, as held by a form or
    /// received from the backend, and convert it.
    ///
    /// The key set must match the mode exactly and no value may be empty.
    pub fn from_parts(
        mode: AuthMode,
        data: &BTreeMap<String, String>,
    ) -> Result<Self, ValidationError> {
        match mode {
            AuthMode::None => {
                check_keys(mode, data, &[])?;
                Ok(AuthCredentials::None)
            }
            AuthMode::Basic => {
                check_keys(mode, data, &BASIC_KEYS)?;
                Ok(AuthCredentials::Basic {
                    username: required(mode, data, "username")?,
                    password: required(mode, data, "password")?,
                })
            }
            AuthMode::OAuth => {
                check_keys(mode, data, &OAUTH_KEYS)?;
                Ok(AuthCredentials::OAuth {
                    token: required(mode, data, "token")?,
                })
            }
            AuthMode::Custom => {
                let mut entries = data.iter();
                let Some((header, value)) = entries.next() else {
                    return Err(ValidationError::AuthMismatch {
                        mode,
                        missing: vec![CUSTOM_PLACEHOLDER.to_string()],
                        unexpected: Vec::new(),
                    });
                };
                let extra: Vec<String> = entries.map(|(k, _)| k.clone()).collect();
                if !extra.is_empty() {
                    return Err(ValidationError::AuthMismatch {
                        mode,
                        missing: Vec::new(),
                        unexpected: extra,
                    });
                }
                if header.trim().is_empty() {
                    return Err(ValidationError::EmptyAuthField {
                        mode,
                        field: CUSTOM_PLACEHOLDER.to_string(),
                    });
                }
                Ok(AuthCredentials::Custom {
                    header: header.clone(),
                    value: required(mode, data, header)?,
                })
            }
        }
    }
}

fn check_keys(
    mode: AuthMode,
    data: &BTreeMap<String, String>,
    expected: &[&str],
) -> Result<(), ValidationError> {
    let missing: Vec<String> = expected
        .iter()
        .filter(|k| !data.contains_key(**k))
        .map(|k| k.to_string())
        .collect();
    let unexpected: Vec<String> = data
        .keys()
        .filter(|k| !expected.contains(&k.as_str()))
        .cloned()
        .collect();

    if missing.is_empty() && unexpected.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::AuthMismatch {
            mode,
            missing,
            unexpected,
        })
    }
}

fn required(
    mode: AuthMode,
    data: &BTreeMap<String, String>,
    key: &str,
) -> Result<String, ValidationError> {
    match data.get(key) {
        Some(value) if !value.is_empty() => Ok(value.clone()),
        _ => Err(ValidationError::EmptyAuthField {
            mode,
            field: key.to_string(),
        }),
    }
}

impl fmt::Debug for AuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthCredentials::None => f.write_str("None"),
            AuthCredentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            AuthCredentials::OAuth { .. } => f
                .debug_struct("OAuth")
                .field("token", &"<redacted>")
                .finish(),
            AuthCredentials::Custom { header, .. } => f
                .debug_struct("Custom")
                .field("header", header)
                .field("value", &"<redacted>")
                .finish(),
        }
    }
}
