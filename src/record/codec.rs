//! Record codec
//!
//! On-disk layout of a timeline value: one format version byte followed by
//! the bincode serialization of the [`Timeline`] (varint integers, trailing
//! bytes rejected, bounded size).

use super::Timeline;
use crate::error::StoreError;
use bincode::Options;

/// Version byte written in front of every encoded record
pub const FORMAT_VERSION: u8 = 1;

/// Default upper bound on the serialized size of one record (16 MiB)
pub const DEFAULT_MAX_RECORD_BYTES: u64 = 16 * 1024 * 1024;

/// Serializes timelines to bytes and back
#[derive(Debug, Clone, Copy)]
pub struct RecordCodec {
    max_record_bytes: u64,
}

impl Default for RecordCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordCodec {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_RECORD_BYTES)
    }

    /// Codec that refuses records whose payload exceeds `max_record_bytes`.
    pub fn with_limit(max_record_bytes: u64) -> Self {
        Self { max_record_bytes }
    }

    pub fn max_record_bytes(&self) -> u64 {
        self.max_record_bytes
    }

    fn options(&self) -> impl Options {
        bincode::DefaultOptions::new()
            .with_limit(self.max_record_bytes)
            .reject_trailing_bytes()
    }

    /// Encode `timeline`. Fails with `Encode` past the size limit or when a
    /// dot's size is NaN or infinite, which would not compare equal after a
    /// round trip.
    pub fn encode(&self, timeline: &Timeline) -> Result<Vec<u8>, StoreError> {
        if let Some((dot_id, _)) = timeline.dots.iter().find(|(_, dot)| !dot.size.is_finite()) {
            return Err(StoreError::encode(format!(
                "dot {} has a non-finite size",
                dot_id
            )));
        }

        let mut buf = Vec::with_capacity(64);
        buf.push(FORMAT_VERSION);
        self.options()
            .serialize_into(&mut buf, timeline)
            .map_err(StoreError::Encode)?;
        Ok(buf)
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Timeline, StoreError> {
        let (version, payload) = bytes
            .split_first()
            .ok_or_else(|| StoreError::decode("empty record"))?;
        if *version != FORMAT_VERSION {
            return Err(StoreError::decode(format!(
                "unsupported record format version {}",
                version
            )));
        }
        // bincode drops the size limit when reading from a slice
        if payload.len() as u64 > self.max_record_bytes {
            return Err(StoreError::decode(format!(
                "record of {} bytes exceeds the {} byte limit",
                payload.len(),
                self.max_record_bytes
            )));
        }
        self.options()
            .deserialize(payload)
            .map_err(|e| StoreError::Decode {
                reason: e.to_string(),
                source: Some(e),
            })
    }
}
