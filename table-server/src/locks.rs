//! Per-key async mutual exclusion
//!
//! The order aggregate is the unit of mutual exclusion: all mutations on
//! one order id run as a strictly ordered, non-overlapping sequence, while
//! different orders proceed fully in parallel. The table-level
//! find-or-create in the session manager needs the same discipline keyed
//! by table id. Both use this map of lazily-created `tokio::sync::Mutex`
//! entries.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Map of per-key async mutexes
#[derive(Debug)]
pub struct KeyedLocks<K: Eq + Hash + Clone> {
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Acquire the mutex for `key`, creating it on first use
    ///
    /// The guard is owned, so it can be held across awaits inside the
    /// critical section (gateway calls suspend).
    pub async fn lock(&self, key: K) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }

    /// Drop the entry for a settled key (terminal order, released table)
    ///
    /// A waiter that already cloned the old Arc proceeds safely; the next
    /// locker creates a fresh entry. Only call this when every path that
    /// could still race re-validates state after acquiring, which is the
    /// case for settled orders: they are terminal and reject mutation.
    pub fn remove(&self, key: &K) {
        self.locks.remove(key);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn same_key_serializes() {
        let locks = Arc::new(KeyedLocks::new());
        let counter = Arc::new(AtomicU32::new(0));
        let max_seen = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let locks = locks.clone();
            let counter = counter.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock("order-1").await;
                let inside = counter.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(inside, Ordering::SeqCst);
                tokio::task::yield_now().await;
                counter.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        // Never more than one task inside the critical section
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.lock(1i64).await;
        // Would deadlock if keys shared a mutex
        let _b = locks.lock(2i64).await;
    }

    #[tokio::test]
    async fn remove_drops_entry() {
        let locks = KeyedLocks::new();
        {
            let _guard = locks.lock("order-1".to_string()).await;
        }
        locks.remove(&"order-1".to_string());
        assert!(locks.is_empty());
    }
}
