use serde::{Deserialize, Serialize};

use super::{deserialize_id, deserialize_nullable, AuthMode};

/// A provider kind (driver) offered by the backend, e.g. Dragonfly.
///
/// Read-only; used as a template when creating instances.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DistributionProvider {
    #[serde(default, alias = "ID", deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, alias = "Name", deserialize_with = "deserialize_nullable")]
    pub name: String,
    /// Icon URL
    #[serde(default, alias = "Icon", deserialize_with = "deserialize_nullable")]
    pub icon: String,
    /// Semantic version of the driver
    #[serde(default, alias = "Version", deserialize_with = "deserialize_nullable")]
    pub version: String,
    /// Source URL
    #[serde(default, alias = "Source", deserialize_with = "deserialize_nullable")]
    pub source: String,
    #[serde(default, alias = "Maintainers", deserialize_with = "deserialize_nullable")]
    pub maintainers: Vec<String>,
    /// Auth mode the driver expects, when it declares one
    #[serde(
        default,
        alias = "AuthMode",
        alias = "authMode",
        skip_serializing_if = "Option::is_none"
    )]
    pub auth_mode: Option<AuthMode>,
}

impl DistributionProvider {
    /// Identifier used to reference this kind from an instance: the id when
    /// the backend sends one, otherwise the name.
    pub fn kind_id(&self) -> &str {
        if self.id.is_empty() {
            &self.name
        } else {
            &self.id
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_go_cased_provider() {
        let json = r#"{
            "ID": "dragonfly",
            "Name": "Dragonfly",
            "icon": "https://example.com/df.png",
            "Maintainers": ["alice", "bob"],
            "Version": "0.10.1",
            "source": "https://github.com/dragonflyoss/Dragonfly",
            "AuthMode": "BASIC"
        }"#;
        let provider: DistributionProvider = serde_json::from_str(json).unwrap();
        assert_eq!(provider.kind_id(), "dragonfly");
        assert_eq!(provider.version, "0.10.1");
        assert_eq!(provider.maintainers, vec!["alice", "bob"]);
        assert_eq!(provider.auth_mode, Some(AuthMode::Basic));
    }

    #[test]
    fn test_kind_id_falls_back_to_name() {
        let provider: DistributionProvider =
            serde_json::from_str(r#"{"name": "Kraken", "maintainers": null}"#).unwrap();
        assert_eq!(provider.kind_id(), "Kraken");
        assert!(provider.maintainers.is_empty());
        assert!(provider.auth_mode.is_none());
    }
}
