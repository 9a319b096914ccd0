// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The asynchronous, panic-isolated event fan-out (spec §4.1).
//!
//! Mirrors the teacher's `Aggregator` hub shape — one hub, many subscribers —
//! but the delivery contract here is stricter: a bounded FIFO feeds a single
//! dispatcher task that snapshots subscriptions before invoking handlers, so
//! a handler fault or a `Subscribe` call racing a dispatch never blocks the
//! producer.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, RwLock};
use tracing::warn;

use crate::event::Event;

/// Default bounded-queue capacity (spec §4.1).
pub const DEFAULT_CAPACITY: usize = 100;

pub type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

/// Opaque handle returned by `subscribe`/`subscribe_session`, used to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    session_filter: Option<String>,
    handler: Handler,
}

/// Bounded-FIFO, single-dispatcher event bus.
pub struct EventBus {
    tx: Mutex<Option<mpsc::Sender<Event>>>,
    subs: Arc<RwLock<Vec<Subscription>>>,
    next_id: AtomicU64,
}

impl EventBus {
    /// Build a bus with [`DEFAULT_CAPACITY`] and spawn its dispatcher task.
    pub fn new() -> Arc<Self> {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Arc<Self> {
        let (tx, rx) = mpsc::channel(capacity);
        let bus = Arc::new(Self {
            tx: Mutex::new(Some(tx)),
            subs: Arc::new(RwLock::new(Vec::new())),
            next_id: AtomicU64::new(0),
        });
        bus.clone().spawn_dispatcher(rx);
        bus
    }

    fn spawn_dispatcher(self: Arc<Self>, mut rx: mpsc::Receiver<Event>) {
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                // Snapshot under the lock, then release it before invoking
                // handlers so a slow/blocking handler never delays Subscribe.
                let snapshot: Vec<Handler> = {
                    let subs = self.subs.read().await;
                    subs.iter()
                        .filter(|s| match &s.session_filter {
                            Some(session_id) => event.source_session_id() == Some(session_id.as_str()),
                            None => true,
                        })
                        .map(|s| s.handler.clone())
                        .collect()
                };
                for handler in snapshot {
                    let event = &event;
                    if let Err(panic) =
                        std::panic::catch_unwind(AssertUnwindSafe(|| handler(event)))
                    {
                        drop(panic);
                        warn!("event bus handler panicked; suppressing");
                    }
                }
            }
        });
    }

    /// Publish an event. Non-blocking: drops the event if the queue is full
    /// or the bus is closed (spec §4.1) — the producer is never made to wait.
    pub fn publish(&self, event: Event) {
        let guard = self.tx.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(tx) = guard.as_ref() {
            if tx.try_send(event).is_err() {
                // Full queue or (briefly, racing Close) a closed receiver: drop.
            }
        }
    }

    /// Register an any-event handler. Returns an id for `unsubscribe`.
    pub async fn subscribe(&self, handler: Handler) -> SubscriptionId {
        self.insert_subscription(None, handler).await
    }

    /// Register a handler filtered to events sourced from `session_id`.
    pub async fn subscribe_session(&self, session_id: impl Into<String>, handler: Handler) -> SubscriptionId {
        self.insert_subscription(Some(session_id.into()), handler).await
    }

    async fn insert_subscription(&self, session_filter: Option<String>, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subs.write().await.push(Subscription { id, session_filter, handler });
        id
    }

    pub async fn unsubscribe(&self, id: SubscriptionId) {
        self.subs.write().await.retain(|s| s.id != id);
    }

    /// Stop accepting new events. Idempotent; the dispatcher drains whatever
    /// was already queued before it exits (spec §4.1).
    pub fn close(&self) {
        let mut guard = self.tx.lock().unwrap_or_else(|e| e.into_inner());
        guard.take();
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
