//! Create, update, enable, disable, delete and preheat.
//!
//! Each operation is one repository call. On success a change event goes out
//! on the notification channel so every synchronizer refreshes; on failure the
//! error is returned as is. Nothing is applied to any local snapshot here.

use std::fmt;

use crate::channel::{ChangeEvent, NotificationChannel};
use crate::error::{DistResult, ResultExt, ValidationError};
use crate::models::{InstanceId, InstancePatch, InstancePayload};
use crate::repository::DistributionRepository;

/// Which mutation ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Enable,
    Disable,
    Delete,
    Preheat,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Enable => "enable",
            MutationKind::Disable => "disable",
            MutationKind::Delete => "delete",
            MutationKind::Preheat => "preheat",
        }
    }

    /// Event published after success. Preheat does not change instances.
    pub fn event(&self) -> Option<ChangeEvent> {
        match self {
            MutationKind::Create => Some(ChangeEvent::Created),
            MutationKind::Update | MutationKind::Enable | MutationKind::Disable => {
                Some(ChangeEvent::Updated)
            }
            MutationKind::Delete => Some(ChangeEvent::Deleted),
            MutationKind::Preheat => None,
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successful mutation, with a message fit for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    pub kind: MutationKind,
    pub instance_id: Option<InstanceId>,
    pub message: String,
}

/// Runs mutations and announces them.
#[derive(Debug, Clone)]
pub struct MutationController {
    repository: DistributionRepository,
    channel: NotificationChannel,
}

impl MutationController {
    pub fn new(repository: DistributionRepository, channel: NotificationChannel) -> Self {
        Self {
            repository,
            channel,
        }
    }

    pub fn channel(&self) -> &NotificationChannel {
        &self.channel
    }

    pub async fn enable(&self, id: &str) -> DistResult<MutationOutcome> {
        self.set_enabled(id, true).await
    }

    pub async fn disable(&self, id: &str) -> DistResult<MutationOutcome> {
        self.set_enabled(id, false).await
    }

    async fn set_enabled(&self, id: &str, enabled: bool) -> DistResult<MutationOutcome> {
        let kind = if enabled {
            MutationKind::Enable
        } else {
            MutationKind::Disable
        };
        self.repository
            .update_instance(id, &InstancePatch::enabled(enabled))
            .await
            .log_failure(kind.as_str())?;

        let message = if enabled {
            format!("Instance {} enabled", id)
        } else {
            format!("Instance {} disabled", id)
        };
        Ok(self.succeeded(kind, Some(id.to_string()), message))
    }

    pub async fn delete(&self, id: &str) -> DistResult<MutationOutcome> {
        self.repository
            .delete_instance(id)
            .await
            .log_failure(MutationKind::Delete.as_str())?;
        Ok(self.succeeded(
            MutationKind::Delete,
            Some(id.to_string()),
            format!("Instance {} deleted", id),
        ))
    }

    pub async fn create(&self, payload: &InstancePayload) -> DistResult<MutationOutcome> {
        let id = self
            .repository
            .create_instance(payload)
            .await
            .log_failure(MutationKind::Create.as_str())?;
        let message = format!("Instance {} created", payload.name);
        Ok(self.succeeded(MutationKind::Create, id, message))
    }

    pub async fn update(&self, id: &str, patch: &InstancePatch) -> DistResult<MutationOutcome> {
        self.repository
            .update_instance(id, patch)
            .await
            .log_failure(MutationKind::Update.as_str())?;
        Ok(self.succeeded(
            MutationKind::Update,
            Some(id.to_string()),
            format!("Instance {} updated", id),
        ))
    }

    /// Request preheating of `images`. Blank entries are dropped; an empty
    /// list is rejected without a network call.
    pub async fn preheat(&self, images: &[String]) -> DistResult<MutationOutcome> {
        let images: Vec<String> = images
            .iter()
            .map(|image| image.trim())
            .filter(|image| !image.is_empty())
            .map(str::to_string)
            .collect();
        if images.is_empty() {
            tracing::warn!("Rejected preheat request without images");
            return Err(ValidationError::NoImages.into());
        }

        self.repository
            .request_preheat(&images)
            .await
            .log_failure(MutationKind::Preheat.as_str())?;
        let message = match images.len() {
            1 => format!("Preheat requested for {}", images[0]),
            n => format!("Preheat requested for {} images", n),
        };
        Ok(self.succeeded(MutationKind::Preheat, None, message))
    }

    fn succeeded(
        &self,
        kind: MutationKind,
        instance_id: Option<InstanceId>,
        message: String,
    ) -> MutationOutcome {
        tracing::info!(
            operation = kind.as_str(),
            instance_id = instance_id.as_deref().unwrap_or_default(),
            "{}",
            message
        );
        if let Some(event) = kind.event() {
            self.channel.publish_event(event);
        }
        MutationOutcome {
            kind,
            instance_id,
            message,
        }
    }
}
