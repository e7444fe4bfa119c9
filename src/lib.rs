//! Timeline: Embedded Record Storage
//!
//! Persists timelines (named collections of dots) and their photos in
//! file-backed sled stores, with scoped open/close discipline around every
//! operation and a read-modify-write protocol for removing a single dot.

pub mod concurrency;
pub mod config;
pub mod error;
pub mod logging;
pub mod record;
pub mod store;
pub mod tooling;
pub mod types;
pub mod views;

pub use error::{ApiError, StoreError, StoreErrorKind};
pub use record::{Dot, Timeline, User};
pub use store::{CompactReport, HandleMode, PhotoStore, StoreHandle, TimelineStore};
