//! Local snapshot of provider instances kept fresh by polling and by
//! change notifications.
//!
//! # Trigger handling
//!
//! At most one fetch is outstanding at any time. A trigger that arrives while
//! a fetch is running is dropped and counted in [`SyncStats::coalesced`]; no
//! follow-up fetch is scheduled for it. The next timer tick or notification
//! picks up anything the running fetch missed.
//!
//! # Failure handling
//!
//! A failed fetch is logged and leaves the previous snapshot in place.
//!
//! # Teardown
//!
//! [`InstanceSynchronizer::close`] stops the timer, unsubscribes from the
//! channel and marks the synchronizer disposed. A fetch that completes after
//! that is discarded. Dropping the synchronizer closes it.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::sync::watch;

use super::timer::PollTimer;
use crate::channel::{ChangeEvent, NotificationChannel, SubscriptionHandle};
use crate::error::DistResult;
use crate::history::paginate;
use crate::models::ProviderInstance;
use crate::repository::DistributionRepository;

/// Page size of the instance grid.
pub const INSTANCE_PAGE_SIZE: usize = 25;

/// Counters for observing synchronizer behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Fetches that replaced the snapshot
    pub fetches: u64,
    /// Fetches that failed and left the snapshot alone
    pub failures: u64,
    /// Triggers dropped because a fetch was already running
    pub coalesced: u64,
    /// Completions dropped because the synchronizer was closed
    pub discarded: u64,
}

/// What a single refresh attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The snapshot was replaced with `total` instances.
    Replaced { total: usize },
    /// The fetch failed; the previous snapshot is still in place.
    Failed,
    /// Another fetch was already running.
    Coalesced,
    /// The synchronizer is closed; nothing was fetched.
    Disposed,
    /// The fetch finished after close and its result was dropped.
    Discarded,
}

/// Where a trigger came from, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Manual,
    Timer,
    Notification(ChangeEvent),
}

#[derive(Debug, Default)]
struct SyncState {
    snapshot: Arc<Vec<ProviderInstance>>,
    in_flight: bool,
    disposed: bool,
    generation: u64,
    stats: SyncStats,
}

struct Inner {
    repository: DistributionRepository,
    state: Mutex<SyncState>,
    changes: watch::Sender<u64>,
}

/// Clears `in_flight` when the fetch ends, however it ends.
struct InFlight {
    inner: Arc<Inner>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.inner.state().in_flight = false;
    }
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, SyncState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claim the in-flight slot, or say why not.
    fn begin(self: &Arc<Self>, trigger: Trigger) -> Result<InFlight, RefreshOutcome> {
        let mut state = self.state();
        if state.disposed {
            tracing::debug!(?trigger, "Ignoring trigger on closed synchronizer");
            return Err(RefreshOutcome::Disposed);
        }
        if state.in_flight {
            state.stats.coalesced += 1;
            tracing::debug!(?trigger, "Fetch already in flight, dropping trigger");
            return Err(RefreshOutcome::Coalesced);
        }
        state.in_flight = true;
        tracing::debug!(?trigger, "Fetching provider instances");
        Ok(InFlight {
            inner: Arc::clone(self),
        })
    }

    /// Start a fetch on the current runtime without waiting for it.
    fn trigger(self: &Arc<Self>, trigger: Trigger) -> bool {
        let guard = match self.begin(trigger) {
            Ok(guard) => guard,
            Err(_) => return false,
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No tokio runtime, cannot fetch provider instances");
            return false;
        };

        let inner = Arc::clone(self);
        runtime.spawn(async move {
            inner.fetch(guard).await;
        });
        true
    }

    async fn fetch(&self, guard: InFlight) -> RefreshOutcome {
        let result = self.repository.list_instances().await;
        let outcome = self.apply(result);
        drop(guard);
        outcome
    }

    fn apply(&self, result: DistResult<Vec<ProviderInstance>>) -> RefreshOutcome {
        let mut state = self.state();
        if state.disposed {
            state.stats.discarded += 1;
            tracing::debug!("Dropping fetch result that completed after close");
            return RefreshOutcome::Discarded;
        }

        match result {
            Ok(instances) => {
                let total = instances.len();
                state.snapshot = Arc::new(instances);
                state.generation += 1;
                state.stats.fetches += 1;
                self.changes.send_replace(state.generation);
                tracing::debug!(count = total, "Provider instances refreshed");
                RefreshOutcome::Replaced { total }
            }
            Err(err) => {
                state.stats.failures += 1;
                tracing::warn!(
                    code = err.error_code(),
                    error = %err,
                    "Failed to fetch provider instances, keeping previous snapshot"
                );
                RefreshOutcome::Failed
            }
        }
    }
}

/// Owner of the local instance snapshot.
pub struct InstanceSynchronizer {
    inner: Arc<Inner>,
    channel: NotificationChannel,
    interval: Duration,
    subscription: Mutex<Option<SubscriptionHandle>>,
    timer: Mutex<Option<PollTimer>>,
}

impl InstanceSynchronizer {
    /// Create a synchronizer and subscribe it to `channel`.
    ///
    /// Every known tag on the channel triggers a refresh. Polling begins with
    /// [`start`](Self::start).
    pub fn new(
        repository: DistributionRepository,
        channel: NotificationChannel,
        interval: Duration,
    ) -> Self {
        let (changes, _) = watch::channel(0);
        let inner = Arc::new(Inner {
            repository,
            state: Mutex::new(SyncState::default()),
            changes,
        });

        let weak: Weak<Inner> = Arc::downgrade(&inner);
        let subscription = channel.subscribe_events(move |event| {
            if let Some(inner) = weak.upgrade() {
                inner.trigger(Trigger::Notification(event));
            }
        });

        Self {
            inner,
            channel,
            interval,
            subscription: Mutex::new(Some(subscription)),
            timer: Mutex::new(None),
        }
    }

    /// Fetch once now and then every `interval`. Calling it again while the
    /// timer runs does nothing.
    pub fn start(&self) {
        {
            // Checked under the timer lock so a concurrent close either sees
            // the new timer or keeps it from being installed.
            let mut timer = lock(&self.timer);
            if self.is_disposed() {
                return;
            }
            if timer.as_ref().is_some_and(PollTimer::is_running) {
                return;
            }
            let weak = Arc::downgrade(&self.inner);
            *timer = Some(PollTimer::start(self.interval, move || match weak.upgrade() {
                Some(inner) => {
                    inner.trigger(Trigger::Timer);
                    true
                }
                None => false,
            }));
        }
        self.inner.trigger(Trigger::Manual);
    }

    /// Request a background refresh. Returns `false` when the trigger was
    /// dropped (fetch already running, closed, or no runtime).
    pub fn trigger(&self) -> bool {
        self.inner.trigger(Trigger::Manual)
    }

    /// Refresh and wait for the result.
    pub async fn refresh(&self) -> RefreshOutcome {
        match self.inner.begin(Trigger::Manual) {
            Ok(guard) => self.inner.fetch(guard).await,
            Err(outcome) => outcome,
        }
    }

    /// The current snapshot. Replaced wholesale on every successful fetch.
    pub fn snapshot(&self) -> Arc<Vec<ProviderInstance>> {
        Arc::clone(&self.inner.state().snapshot)
    }

    pub fn total_count(&self) -> usize {
        self.inner.state().snapshot.len()
    }

    pub fn get(&self, id: &str) -> Option<ProviderInstance> {
        self.snapshot().iter().find(|i| i.id == id).cloned()
    }

    /// Whether the poll timer is running.
    pub fn is_polling(&self) -> bool {
        lock(&self.timer).as_ref().is_some_and(PollTimer::is_running)
    }

    pub fn is_in_flight(&self) -> bool {
        self.inner.state().in_flight
    }

    pub fn stats(&self) -> SyncStats {
        self.inner.state().stats
    }

    /// Instances whose name, endpoint, description, provider or status
    /// contains `keyword`, ignoring case. An empty keyword matches all.
    pub fn filtered(&self, keyword: &str) -> Vec<ProviderInstance> {
        let keyword = keyword.trim();
        self.snapshot()
            .iter()
            .filter(|i| keyword.is_empty() || i.matches_keyword(keyword))
            .cloned()
            .collect()
    }

    /// One-based page of the snapshot, [`INSTANCE_PAGE_SIZE`] per page.
    pub fn page(&self, page: usize) -> Vec<ProviderInstance> {
        paginate(&self.snapshot(), page, INSTANCE_PAGE_SIZE)
    }

    /// Receiver that sees a new generation number after every snapshot
    /// replacement.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.inner.changes.subscribe()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.state().disposed
    }

    /// Stop polling, unsubscribe from the channel and drop any late result.
    /// Calling it again is a no-op.
    pub fn close(&self) {
        let was_open = {
            let mut state = self.inner.state();
            !std::mem::replace(&mut state.disposed, true)
        };

        if let Some(mut timer) = lock(&self.timer).take() {
            timer.stop();
        }
        if let Some(handle) = lock(&self.subscription).take() {
            self.channel.unsubscribe(handle);
        }

        if was_open {
            tracing::debug!("Instance synchronizer closed");
        }
    }

    /// Alias of [`close`](Self::close).
    pub fn dispose(&self) {
        self.close();
    }
}

impl Drop for InstanceSynchronizer {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for InstanceSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state();
        f.debug_struct("InstanceSynchronizer")
            .field("total", &state.snapshot.len())
            .field("in_flight", &state.in_flight)
            .field("disposed", &state.disposed)
            .field("stats", &state.stats)
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
