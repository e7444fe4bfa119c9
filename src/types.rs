//! Core identifier types for timelines, dots, and photos.

/// TimelineID: Stable identifier of a timeline, equal to its store key
pub type TimelineID = String;

/// DotID: Key of a dot inside its parent timeline
pub type DotID = String;

/// PhotoID: Key of a photo blob in the photo store
pub type PhotoID = String;
