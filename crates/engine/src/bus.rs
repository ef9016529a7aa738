// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event bus: fan-out of notifications to subscriber mailboxes.
//!
//! Every subscriber is a bounded mailbox; a full or closed mailbox detaches
//! the subscriber and drops it from every topic set in one pass, so one slow
//! consumer never blocks the others. Delivery is best-effort and per-mailbox
//! order follows publish order.

use parking_lot::Mutex;
use stashhog_core::{Notification, SubscriberId, Topic};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Mailbox depth per subscriber.
const MAILBOX_CAPACITY: usize = 256;

struct SubscriberEntry {
    tx: mpsc::Sender<Notification>,
    topics: HashSet<Topic>,
}

#[derive(Default)]
struct BusInner {
    subscribers: HashMap<SubscriberId, SubscriberEntry>,
    topics: HashMap<Topic, HashSet<SubscriberId>>,
}

/// Shared pub/sub handle.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<BusInner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber, returning its id and mailbox.
    pub fn attach(&self) -> (SubscriberId, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        let id = SubscriberId::new();
        let mut inner = self.inner.lock();
        inner.subscribers.insert(id, SubscriberEntry { tx, topics: HashSet::new() });
        debug!(subscriber = %id, "subscriber attached");
        (id, rx)
    }

    /// Unregister a subscriber and drop it from all topic sets. Idempotent.
    pub fn detach(&self, id: SubscriberId) {
        let mut inner = self.inner.lock();
        detach_locked(&mut inner, id);
    }

    /// Subscribe to one topic. Returns false when the id is not attached.
    pub fn subscribe(&self, id: SubscriberId, topic: Topic) -> bool {
        let mut inner = self.inner.lock();
        let Some(entry) = inner.subscribers.get_mut(&id) else {
            return false;
        };
        entry.topics.insert(topic);
        inner.topics.entry(topic).or_default().insert(id);
        true
    }

    /// Drop one topic subscription. Idempotent.
    pub fn unsubscribe(&self, id: SubscriberId, topic: Topic) {
        let mut inner = self.inner.lock();
        if let Some(entry) = inner.subscribers.get_mut(&id) {
            entry.topics.remove(&topic);
        }
        if let Some(set) = inner.topics.get_mut(&topic) {
            set.remove(&id);
            if set.is_empty() {
                inner.topics.remove(&topic);
            }
        }
    }

    /// Deliver to the notification's topic subscribers and to every attached
    /// subscriber. A failed send detaches that subscriber and delivery
    /// continues.
    pub fn publish(&self, notification: &Notification) {
        let topic = notification.topic();
        let mut inner = self.inner.lock();

        let mut recipients: Vec<SubscriberId> = inner.subscribers.keys().copied().collect();
        if let Some(subscribed) = inner.topics.get(&topic) {
            for id in subscribed {
                if !recipients.contains(id) {
                    recipients.push(*id);
                }
            }
        }

        deliver(&mut inner, &recipients, notification);
    }

    /// Deliver to every attached subscriber.
    pub fn broadcast(&self, notification: &Notification) {
        let mut inner = self.inner.lock();
        let recipients: Vec<SubscriberId> = inner.subscribers.keys().copied().collect();
        deliver(&mut inner, &recipients, notification);
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }
}

fn deliver(inner: &mut BusInner, recipients: &[SubscriberId], notification: &Notification) {
    let mut dead = Vec::new();
    for id in recipients {
        let Some(entry) = inner.subscribers.get(id) else {
            continue;
        };
        if entry.tx.try_send(notification.clone()).is_err() {
            dead.push(*id);
        }
    }
    for id in dead {
        debug!(subscriber = %id, "dropping unresponsive subscriber");
        detach_locked(inner, id);
    }
}

fn detach_locked(inner: &mut BusInner, id: SubscriberId) {
    if let Some(entry) = inner.subscribers.remove(&id) {
        for topic in entry.topics {
            if let Some(set) = inner.topics.get_mut(&topic) {
                set.remove(&id);
                if set.is_empty() {
                    inner.topics.remove(&topic);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
