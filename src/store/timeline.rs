//! Timeline store
//!
//! Encoded timelines keyed by their ID. Every operation runs in its own
//! store scope. Removing a single dot is a read-modify-write across two
//! scopes: with serialized writes off (the default) a concurrent writer to
//! the same timeline can be overwritten between the read and the write.

use super::{CompactReport, StoreHandle};
use crate::concurrency::KeyLockManager;
use crate::error::StoreError;
use crate::record::{RecordCodec, Timeline};
use crate::types::TimelineID;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct TimelineStore {
    handle: StoreHandle,
    codec: RecordCodec,
    /// Present when writers to the same timeline are serialized in-process
    locks: Option<Arc<KeyLockManager>>,
}

impl TimelineStore {
    pub fn new(handle: StoreHandle, codec: RecordCodec) -> Self {
        Self {
            handle,
            codec,
            locks: None,
        }
    }

    /// Hold a per-timeline write lock across `put`, `delete_whole` and the
    /// full read-modify-write of `delete_dot`.
    pub fn with_serialized_writes(mut self) -> Self {
        self.locks = Some(Arc::new(KeyLockManager::new()));
        self
    }

    pub fn handle(&self) -> &StoreHandle {
        &self.handle
    }

    pub fn serializes_writes(&self) -> bool {
        self.locks.is_some()
    }

    /// Timelines with a live write lock entry; zero when no call is in flight
    pub fn held_locks(&self) -> usize {
        self.locks.as_ref().map_or(0, |locks| locks.len())
    }

    /// Run `operation` under the timeline's lock when writes are serialized.
    /// The lock entry is released again once the operation returns.
    fn locked<T>(
        &self,
        id: &str,
        exclusive: bool,
        operation: impl FnOnce() -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let Some(locks) = &self.locks else {
            return operation();
        };
        let lock = locks.get_lock(id);
        let result = if exclusive {
            let _guard = lock.write();
            operation()
        } else {
            let _guard = lock.read();
            operation()
        };
        locks.release(id, lock);
        result
    }

    /// Store `timeline` under `id`, replacing any previous value.
    pub fn put(&self, id: &str, timeline: &Timeline) -> Result<(), StoreError> {
        self.locked(id, true, || self.put_unlocked(id, timeline))
    }

    pub fn get(&self, id: &str) -> Result<Timeline, StoreError> {
        self.locked(id, false, || self.get_unlocked(id))
    }

    /// Remove the whole timeline. Removing an absent timeline succeeds.
    pub fn delete_whole(&self, id: &str) -> Result<(), StoreError> {
        self.locked(id, true, || {
            let existed = self.handle.with_store(|db| {
                db.remove(id.as_bytes())
                    .map(|old| old.is_some())
                    .map_err(|e| self.handle.unavailable(e))
            })?;
            debug!(timeline_id = id, existed, "Deleted timeline");
            Ok(())
        })
    }

    /// Remove one dot from a timeline and persist the rest.
    ///
    /// Fails with `NotFound` if the timeline is absent. An absent dot leaves
    /// the timeline untouched and succeeds.
    pub fn delete_dot(&self, id: &str, dot_id: &str) -> Result<(), StoreError> {
        self.locked(id, true, || {
            let mut timeline = self.get_unlocked(id)?;
            if timeline.remove_dot(dot_id).is_none() {
                debug!(timeline_id = id, dot_id, "Dot not present, nothing to delete");
                return Ok(());
            }
            self.put_unlocked(id, &timeline)?;
            debug!(
                timeline_id = id,
                dot_id,
                remaining = timeline.dots.len(),
                "Deleted dot"
            );
            Ok(())
        })
    }

    pub fn contains(&self, id: &str) -> Result<bool, StoreError> {
        self.handle.with_store(|db| {
            db.contains_key(id.as_bytes())
                .map_err(|e| self.handle.unavailable(e))
        })
    }

    /// Visit every stored `(key, raw value)` pair in one scope.
    ///
    /// Values are passed undecoded. Iteration stops at the first visitor
    /// error, which is returned as is.
    pub fn fold<F, E>(&self, visitor: F) -> Result<(), E>
    where
        F: FnMut(&[u8], &[u8]) -> Result<(), E>,
        E: From<StoreError>,
    {
        fold_store(&self.handle, visitor)
    }

    /// IDs of every stored timeline, in key order
    pub fn ids(&self) -> Result<Vec<TimelineID>, StoreError> {
        let mut ids = Vec::new();
        self.fold(|key, _| {
            ids.push(String::from_utf8_lossy(key).into_owned());
            Ok::<_, StoreError>(())
        })?;
        Ok(ids)
    }

    pub fn compact(&self) -> Result<CompactReport, StoreError> {
        self.handle.compact()
    }

    pub fn codec(&self) -> &RecordCodec {
        &self.codec
    }

    fn put_unlocked(&self, id: &str, timeline: &Timeline) -> Result<(), StoreError> {
        let bytes = self.codec.encode(timeline)?;
        let len = bytes.len();
        self.handle.with_store(|db| {
            db.insert(id.as_bytes(), bytes)
                .map(|_| ())
                .map_err(|e| self.handle.unavailable(e))
        })?;
        debug!(timeline_id = id, bytes = len, dots = timeline.dots.len(), "Stored timeline");
        Ok(())
    }

    fn get_unlocked(&self, id: &str) -> Result<Timeline, StoreError> {
        let bytes = self
            .handle
            .with_store(|db| db.get(id.as_bytes()).map_err(|e| self.handle.unavailable(e)))?
            .ok_or_else(|| StoreError::not_found(id.as_bytes()))?;
        self.codec.decode(&bytes)
    }
}

/// Shared by both stores: iterate one scope, stop on the first error.
pub(crate) fn fold_store<F, E>(handle: &StoreHandle, mut visitor: F) -> Result<(), E>
where
    F: FnMut(&[u8], &[u8]) -> Result<(), E>,
    E: From<StoreError>,
{
    handle.with_store(|db| {
        for item in db.iter() {
            let (key, value) = item.map_err(|e| handle.unavailable(e))?;
            visitor(&key, &value)?;
        }
        Ok(())
    })
}
