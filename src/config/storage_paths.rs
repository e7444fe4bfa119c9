//! StorageConfig: store locations and handle behaviour, and the store
//! constructors built from it.

use crate::config::xdg;
use crate::error::ApiError;
use crate::record::codec::DEFAULT_MAX_RECORD_BYTES;
use crate::record::RecordCodec;
use crate::store::{HandleMode, PhotoStore, StoreHandle, TimelineStore};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_max_record_bytes() -> u64 {
    DEFAULT_MAX_RECORD_BYTES
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Timeline store directory; defaults to `<cache>/timeline-for-humanity/timelines`
    #[serde(default)]
    pub timelines_path: Option<PathBuf>,

    /// Photo store directory; defaults to `<cache>/timeline-for-humanity/photos`
    #[serde(default)]
    pub photos_path: Option<PathBuf>,

    #[serde(default)]
    pub handle_mode: HandleMode,

    /// Serialize in-process writers per timeline ID
    #[serde(default)]
    pub serialize_writes: bool,

    #[serde(default = "default_max_record_bytes")]
    pub max_record_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            timelines_path: None,
            photos_path: None,
            handle_mode: HandleMode::default(),
            serialize_writes: false,
            max_record_bytes: default_max_record_bytes(),
        }
    }
}

impl StorageConfig {
    /// Resolve `(timelines, photos)` store directories, filling unset paths
    /// from the user cache directory.
    pub fn resolve_paths(&self) -> Result<(PathBuf, PathBuf), ApiError> {
        let timelines = match &self.timelines_path {
            Some(path) => path.clone(),
            None => xdg::app_cache_dir()?.join("timelines"),
        };
        let photos = match &self.photos_path {
            Some(path) => path.clone(),
            None => xdg::app_cache_dir()?.join("photos"),
        };

        if timelines == photos {
            return Err(ApiError::ConfigError(format!(
                "Timeline and photo stores cannot share a directory: {}",
                timelines.display()
            )));
        }
        Ok((timelines, photos))
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.max_record_bytes == 0 {
            return Err(ApiError::ConfigError(
                "storage.max_record_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Build both stores from this configuration.
    pub fn open_stores(&self) -> Result<(TimelineStore, PhotoStore), ApiError> {
        self.validate()?;
        let (timelines_path, photos_path) = self.resolve_paths()?;

        let mut timelines = TimelineStore::new(
            StoreHandle::new(timelines_path, self.handle_mode),
            RecordCodec::with_limit(self.max_record_bytes),
        );
        if self.serialize_writes {
            timelines = timelines.with_serialized_writes();
        }
        let photos = PhotoStore::new(StoreHandle::new(photos_path, self.handle_mode));

        Ok((timelines, photos))
    }
}
