//! Repeating, cancellable timer.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Calls a closure every `period` on a background task until stopped.
///
/// The first tick fires one full period after start. Dropping the timer
/// stops it.
#[derive(Debug)]
pub struct PollTimer {
    period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl PollTimer {
    /// Start ticking. `on_tick` returns `false` to end the timer from inside.
    ///
    /// Outside a tokio runtime, or with a zero period, the timer is created
    /// stopped.
    pub fn start<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        if period.is_zero() {
            tracing::warn!("Zero poll period, poll timer not started");
            return Self {
                period,
                handle: None,
            };
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No tokio runtime, poll timer not started");
            return Self {
                period,
                handle: None,
            };
        };

        let handle = runtime.spawn(async move {
            tracing::debug!(period_ms = period.as_millis() as u64, "Poll timer started");
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if !on_tick() {
                    break;
                }
            }
            tracing::debug!("Poll timer finished");
        });

        Self {
            period,
            handle: Some(handle),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel the timer. Safe to call more than once.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!("Poll timer stopped");
        }
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
