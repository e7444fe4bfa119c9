//! Photo store: raw blobs keyed by photo ID, stored without encoding.

use super::timeline::fold_store;
use super::{CompactReport, StoreHandle};
use crate::error::StoreError;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct PhotoStore {
    handle: StoreHandle,
}

impl PhotoStore {
    pub fn new(handle: StoreHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &StoreHandle {
        &self.handle
    }

    pub fn put(&self, id: &str, photo: &[u8]) -> Result<(), StoreError> {
        self.handle.with_store(|db| {
            db.insert(id.as_bytes(), photo)
                .map(|_| ())
                .map_err(|e| self.handle.unavailable(e))
        })?;
        debug!(photo_id = id, bytes = photo.len(), "Stored photo");
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Vec<u8>, StoreError> {
        self.handle
            .with_store(|db| db.get(id.as_bytes()).map_err(|e| self.handle.unavailable(e)))?
            .map(|photo| photo.to_vec())
            .ok_or_else(|| StoreError::not_found(id.as_bytes()))
    }

    /// Remove a photo. Removing an absent photo succeeds.
    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.handle.with_store(|db| {
            db.remove(id.as_bytes())
                .map(|_| ())
                .map_err(|e| self.handle.unavailable(e))
        })
    }

    pub fn contains(&self, id: &str) -> Result<bool, StoreError> {
        self.handle.with_store(|db| {
            db.contains_key(id.as_bytes())
                .map_err(|e| self.handle.unavailable(e))
        })
    }

    pub fn fold<F, E>(&self, visitor: F) -> Result<(), E>
    where
        F: FnMut(&[u8], &[u8]) -> Result<(), E>,
        E: From<StoreError>,
    {
        fold_store(&self.handle, visitor)
    }

    pub fn compact(&self) -> Result<CompactReport, StoreError> {
        self.handle.compact()
    }
}
