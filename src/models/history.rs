use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{deserialize_nullable, deserialize_timestamp};

/// State of a preheat task as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PreheatStatus {
    #[default]
    Pending,
    Running,
    Success,
    Error,
    Fail,
    /// Anything newer than this client knows about.
    Other(String),
}

impl PreheatStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PreheatStatus::Pending => "PENDING",
            PreheatStatus::Running => "RUNNING",
            PreheatStatus::Success => "SUCCESS",
            PreheatStatus::Error => "ERROR",
            PreheatStatus::Fail => "FAIL",
            PreheatStatus::Other(raw) => raw,
        }
    }

    /// Whether the task will not change state any more.
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            PreheatStatus::Success | PreheatStatus::Error | PreheatStatus::Fail
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, PreheatStatus::Error | PreheatStatus::Fail)
    }
}

impl From<String> for PreheatStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PENDING" | "" => PreheatStatus::Pending,
            "RUNNING" => PreheatStatus::Running,
            "SUCCESS" => PreheatStatus::Success,
            "ERROR" => PreheatStatus::Error,
            "FAIL" => PreheatStatus::Fail,
            _ => PreheatStatus::Other(raw),
        }
    }
}

impl From<PreheatStatus> for String {
    fn from(status: PreheatStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for PreheatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One preheat record. Append-only on the backend, read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DistributionHistory {
    #[serde(default, alias = "Image", deserialize_with = "deserialize_nullable")]
    pub image: String,
    #[serde(
        default,
        alias = "Timestamp",
        deserialize_with = "deserialize_timestamp",
        serialize_with = "chrono::serde::ts_seconds_option::serialize"
    )]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, alias = "Status", deserialize_with = "deserialize_nullable")]
    pub status: PreheatStatus,
    /// Provider kind that ran the task
    #[serde(default, alias = "Provider", deserialize_with = "deserialize_nullable")]
    pub provider: String,
    /// Instance id that ran the task
    #[serde(default, alias = "Instance", deserialize_with = "deserialize_nullable")]
    pub instance: String,
}

impl DistributionHistory {
    pub(crate) fn matches_keyword(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [
            self.image.as_str(),
            self.status.as_str(),
            self.provider.as_str(),
            self.instance.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}
