//! Per-key write serialization
//!
//! Provides per-timeline locking for the serialized-writes mode of the
//! timeline store. Writers to the same timeline ID take the key's write lock
//! for the whole read-modify-write; readers take its read lock. Different IDs
//! never block each other.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-key lock manager
///
/// Locks are created on first use and shared through `Arc`, so a lock stays
/// alive for as long as any caller holds it even if it is pruned from the map.
pub struct KeyLockManager {
    locks: Arc<RwLock<HashMap<String, Arc<RwLock<()>>>>>,
}

impl KeyLockManager {
    pub fn new() -> Self {
        Self {
            locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get or create the lock for `key`
    pub fn get_lock(&self, key: &str) -> Arc<RwLock<()>> {
        {
            let map = self.locks.read();
            if let Some(lock) = map.get(key) {
                return lock.clone();
            }
        }

        let mut map = self.locks.write();
        // Another thread may have inserted it between the two map locks.
        map.entry(key.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }

    /// Hand back a lock taken with [`get_lock`](Self::get_lock). The key's
    /// entry is removed once no other caller holds its lock.
    pub fn release(&self, key: &str, lock: Arc<RwLock<()>>) {
        drop(lock);
        let mut map = self.locks.write();
        // Clones are only handed out under the map lock, so a count of one
        // means the map holds the last reference.
        if map.get(key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            map.remove(key);
        }
    }

    /// Drop locks nobody currently holds. Returns how many were removed.
    pub fn prune_idle(&self) -> usize {
        let mut map = self.locks.write();
        let before = map.len();
        map.retain(|_, lock| Arc::strong_count(lock) > 1);
        before - map.len()
    }

    /// Number of keys with a live lock entry
    pub fn len(&self) -> usize {
        self.locks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for KeyLockManager {
    fn default() -> Self {
        Self::new()
    }
}
