//! Pub/Sub notification bus for playback state changes.
//!
//! Every mutation of the engine broadcasts a full `PlaybackState` snapshot
//! to all subscribers, synchronously, in subscription (FIFO) order. The
//! snapshot is an owned clone, so a subscriber can never alias or mutate
//! engine internals through it.
//!
//! Unsubscribing while a broadcast is in flight is safe: `notify` iterates
//! over a cloned callback list, so removal never invalidates the iteration
//! or skips other callbacks.

use std::sync::{Arc, RwLock, Weak};

use log::trace;
use uuid::Uuid;

use crate::core::player::PlaybackState;

type Callback = Arc<dyn Fn(&PlaybackState) + Send + Sync>;

/// Subscriber registry. Cheap to clone (shared backing list).
#[derive(Clone, Default)]
pub struct StateBus {
    subscribers: Arc<RwLock<Vec<(Uuid, Callback)>>>,
}

impl StateBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback; returns a handle whose `unsubscribe()` removes it.
    ///
    /// Callbacks are invoked with a frozen snapshot per notification, even
    /// when the mutation produced no semantic change (scrub-drag UIs rely
    /// on one notification per invocation).
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&PlaybackState) + Send + Sync + 'static,
    {
        let id = Uuid::new_v4();
        self.subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, Arc::new(callback)));
        trace!("StateBus: subscriber {} registered", id);
        Subscription {
            id,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    /// Broadcast a snapshot to every subscriber.
    pub fn notify(&self, state: &PlaybackState) {
        // Clone the callback list first so subscriber-triggered
        // unsubscribes (or new subscribes) cannot disturb this fan-out.
        let callbacks: Vec<Callback> = self
            .subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for cb in callbacks {
            cb(state);
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for StateBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateBus").field("subscribers", &self.len()).finish()
    }
}

/// Handle returned by `subscribe`. Dropping it does NOT unsubscribe;
/// removal is explicit so short-lived handles can be discarded freely.
#[derive(Debug)]
pub struct Subscription {
    id: Uuid,
    subscribers: Weak<RwLock<Vec<(Uuid, Callback)>>>,
}

impl Subscription {
    /// Remove the callback. Idempotent; a no-op if the bus is gone.
    pub fn unsubscribe(&self) {
        if let Some(subs) = self.subscribers.upgrade() {
            subs.write()
                .unwrap_or_else(|e| e.into_inner())
                .retain(|(id, _)| *id != self.id);
            trace!("StateBus: subscriber {} removed", self.id);
        }
    }
}
