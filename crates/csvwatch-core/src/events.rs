//! Change notifications and the in-process notification bus.
//!
//! [`NotificationBus`] keeps one unbounded queue per subscriber, so a
//! published [`ChangeEvent`] is queued for every subscriber before `publish`
//! returns and nothing is dropped when a subscriber falls behind. The bus
//! holds no copy of an event once it has been queued.
//!
//! [`spawn_handler`] drives a [`ChangeHandler`] from its own subscription on a
//! dedicated task, isolating its errors and panics from every other
//! subscriber.

use chrono::{DateTime, Utc};
use futures::FutureExt;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::report::{Failure, Reporter};

/// Identifier handed out by [`NotificationBus::subscribe`].
pub type SubscriberId = u64;

// ---------------------------------------------------------------------------
// ChangeEvent
// ---------------------------------------------------------------------------

/// A file name that was newly observed in the watched directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Bare, directory-relative file name.
    pub filename: String,
    /// When the poller saw it.
    pub observed_at: DateTime<Utc>,
}

impl ChangeEvent {
    /// Create an event stamped with the current time.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            observed_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// NotificationBus
// ---------------------------------------------------------------------------

struct Slot {
    id: SubscriberId,
    name: String,
    tx: mpsc::UnboundedSender<ChangeEvent>,
}

/// Publish/subscribe channel from the poller to any number of subscribers.
pub struct NotificationBus {
    subscribers: RwLock<Vec<Slot>>,
    next_id: AtomicU64,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a subscriber. Every event published after this returns is
    /// delivered to the returned [`Subscription`].
    pub fn subscribe(&self, name: impl Into<String>) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let name = name.into();

        self.subscribers.write().push(Slot {
            id,
            name: name.clone(),
            tx,
        });
        tracing::debug!(subscriber = %name, id, "Subscriber registered");

        Subscription { id, name, rx }
    }

    /// Remove a subscriber. Events already queued for it are still
    /// delivered, after which its subscription ends.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|slot| slot.id != id);
        let removed = subscribers.len() != before;
        if removed {
            tracing::debug!(id, "Subscriber removed");
        }
        removed
    }

    /// Queue `event` for every current subscriber and return how many were
    /// reached.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();
        {
            let subscribers = self.subscribers.read();
            for slot in subscribers.iter() {
                if slot.tx.send(event.clone()).is_ok() {
                    delivered += 1;
                } else {
                    closed.push(slot.id);
                }
            }
        }

        // Receivers that were dropped without unsubscribing.
        if !closed.is_empty() {
            self.subscribers.write().retain(|slot| {
                let keep = !closed.contains(&slot.id);
                if !keep {
                    tracing::debug!(subscriber = %slot.name, "Pruned closed subscriber");
                }
                keep
            });
        }

        delivered
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of a bus subscription.
pub struct Subscription {
    id: SubscriberId,
    name: String,
    rx: mpsc::UnboundedReceiver<ChangeEvent>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait for the next event. Returns `None` once unsubscribed and drained.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }

    /// Take the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Something that reacts to change events.
#[async_trait::async_trait]
pub trait ChangeHandler: Send + Sync + 'static {
    /// Name used in logs and failure reports.
    fn name(&self) -> &str;

    /// Handle one event.
    async fn on_change(&self, event: &ChangeEvent) -> crate::Result<()>;
}

/// A running handler spawned by [`spawn_handler`].
pub struct HandlerTask {
    id: SubscriberId,
    name: String,
    handle: JoinHandle<u64>,
}

impl HandlerTask {
    /// The bus subscription backing this task.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait for the task to finish and return how many events it handled.
    pub async fn join(self) -> u64 {
        match self.handle.await {
            Ok(handled) => handled,
            Err(e) => {
                tracing::error!(subscriber = %self.name, "Handler task aborted: {e}");
                0
            }
        }
    }
}

/// Subscribe `handler` to `bus` and drive it on its own task.
///
/// Events are handled one at a time in emission order. An error or panic
/// from the handler is reported as [`Failure::Handler`] and the task keeps
/// receiving. The task ends when `cancel` fires or after the subscription is
/// removed with [`NotificationBus::unsubscribe`] and drained.
pub fn spawn_handler(
    bus: &NotificationBus,
    handler: Arc<dyn ChangeHandler>,
    reporter: Arc<dyn Reporter>,
    cancel: CancellationToken,
) -> HandlerTask {
    let mut subscription = bus.subscribe(handler.name());
    let id = subscription.id();
    let name = handler.name().to_string();
    let task_name = name.clone();

    let handle = tokio::spawn(async move {
        let mut handled = 0u64;

        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                event = subscription.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            handled += 1;
            let outcome = AssertUnwindSafe(handler.on_change(&event))
                .catch_unwind()
                .await;

            let message = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e.to_string(),
                Err(panic) => panic_message(panic.as_ref()),
            };
            reporter.failed(&Failure::Handler {
                subscriber: task_name.clone(),
                message,
            });
        }

        tracing::debug!(subscriber = %task_name, handled, "Handler stopped");
        handled
    });

    HandlerTask { id, name, handle }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
