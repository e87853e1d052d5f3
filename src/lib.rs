//! distsync - keeps a local view of image distribution provider instances in
//! sync with the registry backend.
//!
//! The pieces, leaf first:
//!
//! - [`repository::DistributionRepository`] - REST client for `/api/distribution`
//! - [`channel::NotificationChannel`] - in-process change notifications
//! - [`sync::InstanceSynchronizer`] - polled and event-refreshed instance snapshot
//! - [`mutation::MutationController`] - create, update, enable, disable, delete, preheat
//! - [`setup::SetupWorkflow`] - create/edit form state machine
//!
//! This library also exposes its test doubles for use in integration tests.

pub mod adapters;
pub mod channel;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod models;
pub mod mutation;
pub mod repository;
pub mod setup;
pub mod sync;
pub mod traits;

pub use channel::{ChangeEvent, NotificationChannel, SubscriptionHandle};
pub use config::{ApiCredential, ClientConfig};
pub use error::{DistError, DistResult};
pub use mutation::{MutationController, MutationKind, MutationOutcome};
pub use repository::DistributionRepository;
pub use setup::{SetupMode, SetupWorkflow};
pub use sync::{InstanceSynchronizer, RefreshOutcome};
