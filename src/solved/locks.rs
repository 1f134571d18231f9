//! Per-topic mutual exclusion for acceptance transitions.
//!
//! Entries are created on demand and removed once the last holder or
//! waiter lets go, so the map only ever holds topics with a transition in
//! flight.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-topic locks.
#[derive(Debug, Default, Clone)]
pub struct TopicLocks {
    locks: Arc<DashMap<i64, Arc<Mutex<()>>>>,
}

impl TopicLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `topic_id`.
    pub async fn acquire(&self, topic_id: i64) -> TopicLockGuard {
        let lock = Arc::clone(self.locks.entry(topic_id).or_default().value());
        let guard = lock.lock_owned().await;
        TopicLockGuard {
            topic_id,
            guard: Some(guard),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of topics with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Held for the duration of one transition.
#[derive(Debug)]
pub struct TopicLockGuard {
    topic_id: i64,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<DashMap<i64, Arc<Mutex<()>>>>,
}

impl Drop for TopicLockGuard {
    fn drop(&mut self) {
        // Release first so our own Arc no longer counts towards the check.
        self.guard.take();
        self.locks
            .remove_if(&self.topic_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
