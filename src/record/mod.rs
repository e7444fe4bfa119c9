//! Timeline Records
//!
//! A timeline is a named collection of dots keyed by dot ID. Timelines are the
//! unit of storage; dots have no identity beyond their key inside the parent.

pub mod codec;

use crate::types::{DotID, PhotoID, TimelineID};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use codec::RecordCodec;

/// A single point on a timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dot {
    pub title: String,
    #[serde(default, rename = "descr")]
    pub description: Option<String>,
    /// Key of the attached photo in the photo store, if any
    #[serde(default)]
    pub photo_id: Option<PhotoID>,
    #[serde(default)]
    pub size: f64,
    /// Seconds since the Unix epoch
    #[serde(default)]
    pub epoch: i64,
}

impl Dot {
    pub fn new(title: impl Into<String>, size: f64, epoch: i64) -> Self {
        Self {
            title: title.into(),
            description: None,
            photo_id: None,
            size,
            epoch,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_photo(mut self, photo_id: impl Into<PhotoID>) -> Self {
        self.photo_id = Some(photo_id.into());
        self
    }

    /// Epoch as a UTC timestamp; `None` when out of chrono's range.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.epoch, 0)
    }
}

/// Timeline record
///
/// `dots` is an ordered map so a given logical value always encodes to the
/// same bytes, whatever order the dots were inserted in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default, rename = "timelineID")]
    pub id: TimelineID,
    #[serde(default)]
    pub dots: BTreeMap<DotID, Dot>,
}

impl Timeline {
    pub fn new(id: impl Into<TimelineID>) -> Self {
        Self {
            alias: None,
            id: id.into(),
            dots: BTreeMap::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_dot(mut self, dot_id: impl Into<DotID>, dot: Dot) -> Self {
        self.dots.insert(dot_id.into(), dot);
        self
    }

    /// Remove a dot; absent keys are a no-op.
    pub fn remove_dot(&mut self, dot_id: &str) -> Option<Dot> {
        self.dots.remove(dot_id)
    }
}

/// User record
///
/// Not read or written by any store operation yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub timelines: Vec<TimelineID>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_dot_is_idempotent() {
        let mut timeline = Timeline::new("t1")
            .with_dot("a", Dot::new("A", 1.0, 100))
            .with_dot("b", Dot::new("B", 2.0, 200));

        assert!(timeline.remove_dot("a").is_some());
        assert!(timeline.remove_dot("a").is_none());
        assert!(timeline.remove_dot("zzz").is_none());
        assert_eq!(timeline.dots.len(), 1);
        assert!(timeline.dots.contains_key("b"));
    }

    #[test]
    fn test_json_field_names() {
        let timeline = Timeline::new("t1").with_alias("mine").with_dot(
            "d1",
            Dot::new("A", 1.5, 100)
                .with_description("first")
                .with_photo("p1"),
        );
        let json = serde_json::to_value(&timeline).unwrap();
        assert_eq!(json["timelineID"], "t1");
        assert_eq!(json["alias"], "mine");
        assert_eq!(json["dots"]["d1"]["descr"], "first");
        assert_eq!(json["dots"]["d1"]["photo_id"], "p1");
        assert_eq!(json["dots"]["d1"]["epoch"], 100);
    }

    #[test]
    fn test_json_optional_fields_default() {
        let timeline: Timeline =
            serde_json::from_str(r#"{"dots": {"d1": {"title": "A", "size": 1.0, "epoch": 100}}}"#)
                .unwrap();
        assert_eq!(timeline.id, "");
        assert_eq!(timeline.alias, None);
        let dot = &timeline.dots["d1"];
        assert_eq!(dot.description, None);
        assert_eq!(dot.photo_id, None);

        let empty: Timeline = serde_json::from_str("{}").unwrap();
        assert!(empty.dots.is_empty());
    }

    #[test]
    fn test_dot_timestamp() {
        let dot = Dot::new("A", 1.0, 0);
        assert_eq!(dot.timestamp().unwrap().to_rfc3339(), "1970-01-01T00:00:00+00:00");
        assert!(Dot::new("far", 1.0, i64::MAX).timestamp().is_none());
    }
}
