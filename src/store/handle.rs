//! Scoped store handles
//!
//! A [`StoreHandle`] binds one sled directory and hands out scopes: each
//! scope opens the store, runs an operation against it, flushes, and closes
//! it again on every exit path, including unwinding.
//!
//! sled takes an exclusive lock on an open directory, so scopes on the same
//! handle are serialized in [`HandleMode::PerOperation`]. Clones of a handle
//! share that serialization. A scope opened from inside another scope on the
//! same thread (a `fold` visitor calling back into its store) reuses the
//! store the outer scope opened. Two independent handles on the same
//! directory contend for the lock and the loser fails with
//! `StoreError::Unavailable`.

use super::CompactReport;
use crate::error::StoreError;
use parking_lot::ReentrantMutex;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Open attempts before a lock or I/O failure on open is reported
const OPEN_ATTEMPTS: u32 = 5;

/// Base delay between open attempts; grows linearly per attempt
const OPEN_BACKOFF: Duration = Duration::from_millis(20);

/// How long a store stays open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleMode {
    /// Open and close around every scope
    #[default]
    PerOperation,
    /// Open lazily once and keep the store open for the handle's lifetime
    Persistent,
}

/// Scoped access to one sled directory
#[derive(Clone)]
pub struct StoreHandle {
    path: PathBuf,
    mode: HandleMode,
    /// Serializes per-operation scopes and holds the store while one is open;
    /// caches the store in persistent mode
    slot: Arc<ReentrantMutex<RefCell<Option<sled::Db>>>>,
}

/// Empties the slot when the outermost per-operation scope ends, unwinding
/// included, so the store is dropped and its directory lock released.
struct ScopeExit<'a>(&'a RefCell<Option<sled::Db>>);

impl Drop for ScopeExit<'_> {
    fn drop(&mut self) {
        self.0.borrow_mut().take();
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .finish()
    }
}

impl StoreHandle {
    pub fn new(path: impl Into<PathBuf>, mode: HandleMode) -> Self {
        Self {
            path: path.into(),
            mode,
            slot: Arc::new(ReentrantMutex::new(RefCell::new(None))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> HandleMode {
        self.mode
    }

    /// Whether the handle currently holds the store open: a cached persistent
    /// store, or a per-operation scope running on this thread
    pub fn is_open(&self) -> bool {
        self.slot.lock().borrow().is_some()
    }

    /// Wrap a sled failure against this handle's directory
    pub(crate) fn unavailable(&self, source: sled::Error) -> StoreError {
        StoreError::unavailable(&self.path, source)
    }

    /// Run `operation` against the open store.
    ///
    /// If the store cannot be opened, `operation` is never invoked and the
    /// open failure is returned. Otherwise the store is flushed and released
    /// before returning, and the operation's own error takes precedence over
    /// a flush failure.
    pub fn with_store<T, E, F>(&self, operation: F) -> Result<T, E>
    where
        F: FnOnce(&sled::Db) -> Result<T, E>,
        E: From<StoreError>,
    {
        match self.mode {
            HandleMode::PerOperation => {
                let scope = self.slot.lock();
                let nested = scope.borrow().clone();
                if let Some(db) = nested {
                    // The outermost scope flushes and closes
                    return operation(&db);
                }

                let db = open_at(&self.path)?;
                *scope.borrow_mut() = Some(db.clone());
                let exit = ScopeExit(&*scope);
                let result = operation(&db);
                let flushed = db.flush().map_err(|e| self.unavailable(e));
                drop(exit);
                drop(db);
                finish(result, flushed)
            }
            HandleMode::Persistent => {
                let db = {
                    let slot = self.slot.lock();
                    let cached = slot.borrow().clone();
                    match cached {
                        Some(db) => db,
                        None => {
                            let db = open_at(&self.path)?;
                            *slot.borrow_mut() = Some(db.clone());
                            db
                        }
                    }
                };
                let result = operation(&db);
                let flushed = db.flush().map_err(|e| self.unavailable(e));
                finish(result, flushed)
            }
        }
    }

    /// Close the cached store of a persistent handle. No-op otherwise.
    pub fn close(&self) -> Result<(), StoreError> {
        if self.mode != HandleMode::Persistent {
            return Ok(());
        }
        let slot = self.slot.lock();
        let cached = slot.borrow_mut().take();
        if let Some(db) = cached {
            db.flush().map_err(|e| self.unavailable(e))?;
        }
        Ok(())
    }

    /// Reclaim space by rewriting the live entries into a fresh directory
    /// and swapping it into place.
    ///
    /// sled exposes no explicit compaction call; a rewrite drops every
    /// segment held only by overwritten or removed values.
    ///
    /// Fails with `Unavailable` when called from inside a scope on the same
    /// handle, since that scope keeps the directory locked.
    pub fn compact(&self) -> Result<CompactReport, StoreError> {
        let slot = self.slot.lock();
        let open = slot.borrow_mut().take();
        if let Some(db) = open {
            if self.mode == HandleMode::PerOperation {
                *slot.borrow_mut() = Some(db);
                return Err(StoreError::io(
                    &self.path,
                    std::io::Error::new(
                        std::io::ErrorKind::WouldBlock,
                        "cannot compact from inside an open store scope",
                    ),
                ));
            }
            // A persistent scope still running on a clone of the cached store
            // keeps the directory locked, and the reopen below fails.
            db.flush().map_err(|e| self.unavailable(e))?;
        }

        let staging = sibling(&self.path, "compacting");
        let backup = sibling(&self.path, "precompact");
        remove_dir_if_exists(&staging)?;

        let report = match copy_live_entries(&self.path, &staging) {
            Ok(report) => report,
            Err(e) => {
                let _ = std::fs::remove_dir_all(&staging);
                return Err(e);
            }
        };

        remove_dir_if_exists(&backup)?;
        std::fs::rename(&self.path, &backup).map_err(|e| StoreError::io(&self.path, e))?;
        if let Err(e) = std::fs::rename(&staging, &self.path) {
            let _ = std::fs::rename(&backup, &self.path);
            return Err(StoreError::io(&self.path, e));
        }
        std::fs::remove_dir_all(&backup).map_err(|e| StoreError::io(&backup, e))?;

        debug!(
            path = %self.path.display(),
            entries = report.entries,
            bytes_before = report.bytes_before,
            bytes_after = report.bytes_after,
            "Compacted store"
        );
        Ok(report)
    }
}

/// The operation's error takes precedence over a flush failure.
fn finish<T, U, E: From<StoreError>>(
    result: Result<T, E>,
    flushed: Result<U, StoreError>,
) -> Result<T, E> {
    let value = result?;
    flushed?;
    Ok(value)
}

/// Open the sled directory at `path`, creating its parent if needed.
///
/// A store released a moment ago may still hold the directory lock while its
/// last buffers drain, so open failures are retried briefly.
fn open_at(path: &Path) -> Result<sled::Db, StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::io(path, e))?;
    }

    let mut attempt = 1;
    loop {
        match sled::Config::new().path(path).open() {
            Ok(db) => return Ok(db),
            Err(sled::Error::Io(e)) if attempt < OPEN_ATTEMPTS => {
                trace!(path = %path.display(), attempt, error = %e, "Store open failed, retrying");
                std::thread::sleep(OPEN_BACKOFF * attempt);
                attempt += 1;
            }
            Err(e) => return Err(StoreError::unavailable(path, e)),
        }
    }
}

fn copy_live_entries(source_path: &Path, target_path: &Path) -> Result<CompactReport, StoreError> {
    let source = open_at(source_path)?;
    let target = open_at(target_path)?;

    let bytes_before = source
        .size_on_disk()
        .map_err(|e| StoreError::unavailable(source_path, e))?;

    let mut entries = 0;
    for item in source.iter() {
        let (key, value) = item.map_err(|e| StoreError::unavailable(source_path, e))?;
        target
            .insert(key, value)
            .map_err(|e| StoreError::unavailable(target_path, e))?;
        entries += 1;
    }

    target
        .flush()
        .map_err(|e| StoreError::unavailable(target_path, e))?;
    let bytes_after = target
        .size_on_disk()
        .map_err(|e| StoreError::unavailable(target_path, e))?;

    Ok(CompactReport {
        entries,
        bytes_before,
        bytes_after,
    })
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}", suffix));
    path.with_file_name(name)
}

fn remove_dir_if_exists(path: &Path) -> Result<(), StoreError> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StoreError::io(path, e)),
    }
}
