//! Setup form workflow for provider instances.

pub mod workflow;

pub use workflow::{SetupMode, SetupWorkflow, SubmitReceipt, WorkflowState};
