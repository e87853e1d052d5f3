//! Create/edit lifecycle of a provider instance form.
//!
//! ```text
//! Closed --open_for_create--> Open(Create)
//! Closed --open_for_edit----> Open(Edit)
//! Open   --open_*-----------> Open (working copy replaced)
//! Open   --cancel-----------> Closed
//! Open   --submit-----------> Closed (after local validation passes)
//! ```
//!
//! Local validation failures keep the form open and never reach the network.

use std::fmt;

use crate::error::{DistResult, ValidationError};
use crate::models::{
    AuthCredentials, AuthMode, DistributionProvider, InstancePatch, InstancePayload,
    ProviderInstance, ProviderRef,
};
use crate::mutation::{MutationController, MutationOutcome};

/// Whether the form creates a new instance or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupMode {
    Create,
    Edit,
}

impl fmt::Display for SetupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupMode::Create => f.write_str("create"),
            SetupMode::Edit => f.write_str("edit"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    Closed,
    Open {
        mode: SetupMode,
        target: ProviderInstance,
    },
}

/// Result of a submit that reached the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub mode: SetupMode,
    pub outcome: MutationOutcome,
}

/// The create/edit form state machine.
#[derive(Debug)]
pub struct SetupWorkflow {
    controller: MutationController,
    state: WorkflowState,
}

impl SetupWorkflow {
    pub fn new(controller: MutationController) -> Self {
        Self {
            controller,
            state: WorkflowState::Closed,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, WorkflowState::Open { .. })
    }

    pub fn mode(&self) -> Option<SetupMode> {
        match &self.state {
            WorkflowState::Open { mode, .. } => Some(*mode),
            WorkflowState::Closed => None,
        }
    }

    /// Open a blank form, optionally for a chosen provider kind.
    ///
    /// The working copy gets a random placeholder id, is enabled, and starts
    /// on BASIC auth. The mode the provider declares is reported by
    /// [`effective_auth_mode`](Self::effective_auth_mode); switch to it with
    /// [`set_auth_mode`](Self::set_auth_mode).
    pub fn open_for_create(&mut self, provider: Option<DistributionProvider>) {
        let target = ProviderInstance {
            id: uuid::Uuid::new_v4().to_string(),
            enabled: true,
            provider: provider.map(ProviderRef::Embedded),
            auth_mode: AuthMode::Basic,
            auth_data: AuthMode::Basic.form_template(),
            ..Default::default()
        };
        self.replace(SetupMode::Create, target);
    }

    /// Open the form on a copy of an existing instance.
    pub fn open_for_edit(&mut self, instance: ProviderInstance) {
        self.replace(SetupMode::Edit, instance);
    }

    fn replace(&mut self, mode: SetupMode, target: ProviderInstance) {
        if let WorkflowState::Open { target: previous, .. } = &self.state {
            tracing::debug!(previous = %previous.id, "Replacing open setup form");
        }
        tracing::debug!(%mode, instance_id = %target.id, "Setup form opened");
        self.state = WorkflowState::Open { mode, target };
    }

    pub fn working_copy(&self) -> Option<&ProviderInstance> {
        match &self.state {
            WorkflowState::Open { target, .. } => Some(target),
            WorkflowState::Closed => None,
        }
    }

    pub fn working_copy_mut(&mut self) -> Option<&mut ProviderInstance> {
        match &mut self.state {
            WorkflowState::Open { target, .. } => Some(target),
            WorkflowState::Closed => None,
        }
    }

    /// Switch the auth mode of the working copy and reset its fields to the
    /// new mode's blank template.
    pub fn set_auth_mode(&mut self, mode: AuthMode) -> Result<(), ValidationError> {
        let target = self.working_copy_mut().ok_or(ValidationError::NotOpen)?;
        if target.auth_mode != mode {
            target.auth_mode = mode;
            target.auth_data = mode.form_template();
        }
        Ok(())
    }

    /// Close without submitting.
    pub fn cancel(&mut self) {
        if self.is_open() {
            tracing::debug!("Setup form cancelled");
        }
        self.state = WorkflowState::Closed;
    }

    /// Validate the working copy and send it.
    ///
    /// On a validation error nothing is sent and the form stays open. Once
    /// validation passes the form closes before the request is made, so it is
    /// closed whatever the backend answers.
    pub async fn submit(&mut self) -> DistResult<SubmitReceipt> {
        let (mode, payload) = match &self.state {
            WorkflowState::Closed => return Err(ValidationError::NotOpen.into()),
            WorkflowState::Open { mode, target } => match build_payload(*mode, target) {
                Ok(payload) => (*mode, payload),
                Err(err) => {
                    tracing::warn!(
                        code = err.error_code(),
                        error = %err,
                        "Setup form rejected"
                    );
                    return Err(err.into());
                }
            },
        };

        let WorkflowState::Open { target, .. } = std::mem::take(&mut self.state) else {
            return Err(ValidationError::NotOpen.into());
        };

        let outcome = match mode {
            SetupMode::Create => self.controller.create(&payload).await?,
            SetupMode::Edit => {
                self.controller
                    .update(&target.id, &InstancePatch::from(&payload))
                    .await?
            }
        };
        Ok(SubmitReceipt { mode, outcome })
    }

    pub fn title(&self) -> &'static str {
        match self.mode() {
            Some(SetupMode::Edit) => "Edit Instance",
            _ => "Setup new instance",
        }
    }

    pub fn enabled_label(&self) -> &'static str {
        match self.working_copy() {
            Some(target) if target.enabled => "ON",
            _ => "OFF",
        }
    }

    /// Auth mode the chosen provider kind declares, BASIC otherwise.
    pub fn effective_auth_mode(&self) -> AuthMode {
        self.working_copy()
            .and_then(|target| target.provider.as_ref())
            .and_then(ProviderRef::embedded)
            .and_then(|provider| provider.auth_mode)
            .unwrap_or(AuthMode::Basic)
    }
}

/// Check the working copy and turn it into an outbound payload.
fn build_payload(
    mode: SetupMode,
    target: &ProviderInstance,
) -> Result<InstancePayload, ValidationError> {
    let name = target.name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingField { field: "name" });
    }

    let endpoint = target.endpoint.trim();
    if endpoint.is_empty() {
        return Err(ValidationError::MissingField { field: "endpoint" });
    }
    if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        return Err(ValidationError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
        });
    }

    let credentials = AuthCredentials::from_parts(target.auth_mode, &target.auth_data)?;
    let mut payload = InstancePayload::new(name, endpoint, credentials).with_enabled(target.enabled);
    if let Some(kind) = target.provider_kind() {
        payload = payload.with_provider(kind);
    }
    if mode == SetupMode::Edit {
        if let Some(description) = &target.description {
            payload = payload.with_description(description.clone());
        }
    }
    Ok(payload)
}
