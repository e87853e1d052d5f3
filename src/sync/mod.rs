//! Polling and notification driven synchronization of the instance list.

mod synchronizer;
mod timer;

pub use synchronizer::{InstanceSynchronizer, RefreshOutcome, SyncStats, INSTANCE_PAGE_SIZE};
pub use timer::PollTimer;
