//! In-process publish/subscribe bus for change notifications.
//!
//! Handlers run synchronously on the publisher's task, in subscription order.
//! The registry lock is released before any handler is called, so a handler
//! may publish, subscribe or unsubscribe without deadlocking.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Tags the core understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeEvent {
    Created,
    Updated,
    Deleted,
}

impl ChangeEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeEvent::Created => "created",
            ChangeEvent::Updated => "updated",
            ChangeEvent::Deleted => "deleted",
        }
    }

    /// `None` for tags outside the known set.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "created" => Some(ChangeEvent::Created),
            "updated" => Some(ChangeEvent::Updated),
            "deleted" => Some(ChangeEvent::Deleted),
            _ => None,
        }
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Handler = Arc<dyn Fn(&str) + Send + Sync>;

/// Token returned by [`NotificationChannel::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

/// A registered handler. `active` is cleared on unsubscribe so a publish
/// already under way skips it.
#[derive(Clone)]
struct Subscriber {
    id: u64,
    active: Arc<AtomicBool>,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: Vec<Subscriber>,
}

/// Multicast bus of string-tagged messages. Cloning shares the registry.
#[derive(Clone, Default)]
pub struct NotificationChannel {
    registry: Arc<Mutex<Registry>>,
}

impl NotificationChannel {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a raw handler; it sees every tag, known or not.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionHandle
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let mut registry = self.registry();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.handlers.push(Subscriber {
            id,
            active: Arc::new(AtomicBool::new(true)),
            handler: Arc::new(handler),
        });
        tracing::debug!(subscription = id, "Subscribed to notification channel");
        SubscriptionHandle(id)
    }

    /// Register a handler for the known tags. Unknown tags are logged and
    /// skipped for this subscriber.
    pub fn subscribe_events<F>(&self, handler: F) -> SubscriptionHandle
    where
        F: Fn(ChangeEvent) + Send + Sync + 'static,
    {
        self.subscribe(move |tag| match ChangeEvent::parse(tag) {
            Some(event) => handler(event),
            None => tracing::warn!(tag, "Ignoring unknown notification tag"),
        })
    }

    /// Remove a handler. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let mut registry = self.registry();
        let Some(index) = registry.handlers.iter().position(|s| s.id == handle.0) else {
            return false;
        };
        let removed = registry.handlers.remove(index);
        removed.active.store(false, Ordering::SeqCst);
        drop(registry);
        tracing::debug!(subscription = handle.0, "Unsubscribed from notification channel");
        true
    }

    /// Deliver `tag` to every current subscriber. A handler unsubscribed by
    /// an earlier handler in the same publish is skipped. Returns how many
    /// handlers completed without panicking.
    pub fn publish(&self, tag: &str) -> usize {
        let subscribers: Vec<Subscriber> = self.registry().handlers.clone();
        let mut delivered = 0;

        for subscriber in subscribers {
            if !subscriber.active.load(Ordering::SeqCst) {
                continue;
            }
            match catch_unwind(AssertUnwindSafe(|| (subscriber.handler)(tag))) {
                Ok(()) => delivered += 1,
                Err(_) => tracing::error!(
                    subscription = subscriber.id,
                    tag,
                    "Notification handler panicked"
                ),
            }
        }

        delivered
    }

    pub fn publish_event(&self, event: ChangeEvent) -> usize {
        self.publish(event.as_str())
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry().handlers.len()
    }
}

impl fmt::Debug for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationChannel")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
