//! Subscriber registry with latest-value delivery

use crate::broadcast::BroadcastError;
use log::{debug, trace};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Opaque subscriber handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

type Slot = watch::Sender<Option<Arc<str>>>;

struct Inner {
    next_id: AtomicU64,
    subscribers: Mutex<HashMap<SubscriberId, Slot>>,
}

/// Fan-out point between the sampling loop and connected subscribers.
///
/// Each subscriber owns a single-value slot: publishing overwrites it, so a
/// slow subscriber skips stale states instead of queueing them and the
/// publisher never waits.
#[derive(Clone)]
pub struct BroadcastHub {
    inner: Arc<Inner>,
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                next_id: AtomicU64::new(1),
                subscribers: Mutex::new(HashMap::new()),
            }),
        }
    }

    fn subscribers(&self) -> MutexGuard<'_, HashMap<SubscriberId, Slot>> {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a subscriber; it receives every publish from now on.
    pub fn subscribe(&self) -> Subscription {
        let id = SubscriberId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = watch::channel(None);
        self.subscribers().insert(id, tx);
        debug!("Subscriber {:?} joined", id);

        Subscription {
            id,
            rx,
            hub: self.clone(),
        }
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        if self.subscribers().remove(&id).is_some() {
            debug!("Subscriber {:?} left", id);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers().len()
    }

    /// Serialize `state` once and hand it to every subscriber.
    ///
    /// Returns how many subscribers received it. With no subscribers nothing
    /// is serialized. Subscribers whose receiving end is gone are dropped.
    pub fn publish<T: Serialize>(&self, state: &T) -> Result<usize, BroadcastError> {
        let mut subscribers = self.subscribers();
        if subscribers.is_empty() {
            return Ok(0);
        }

        let document: Arc<str> = Arc::from(serde_json::to_string(state)?);

        let mut gone = Vec::new();
        for (id, slot) in subscribers.iter() {
            if slot.send(Some(Arc::clone(&document))).is_err() {
                gone.push(*id);
            }
        }

        for id in &gone {
            subscribers.remove(id);
            debug!("Dropped closed subscriber {:?}", id);
        }

        let delivered = subscribers.len();
        trace!("Published to {} subscriber(s)", delivered);
        Ok(delivered)
    }
}

/// Receiving side of one subscriber; unsubscribes on drop.
pub struct Subscription {
    id: SubscriberId,
    rx: watch::Receiver<Option<Arc<str>>>,
    hub: BroadcastHub,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next state newer than the last one seen.
    ///
    /// Returns `None` once the hub has dropped this subscriber.
    pub async fn next(&mut self) -> Option<Arc<str>> {
        loop {
            self.rx.changed().await.ok()?;
            if let Some(document) = self.rx.borrow_and_update().clone() {
                return Some(document);
            }
        }
    }

    /// Latest state without waiting, if any was published since subscribing
    pub fn latest(&self) -> Option<Arc<str>> {
        self.rx.borrow().clone()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.id);
    }
}
