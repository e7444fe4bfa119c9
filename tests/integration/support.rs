use tempfile::TempDir;
use timeline::record::RecordCodec;
use timeline::{Dot, HandleMode, PhotoStore, StoreHandle, Timeline, TimelineStore};

pub fn timeline_store(temp: &TempDir, mode: HandleMode) -> TimelineStore {
    TimelineStore::new(
        StoreHandle::new(temp.path().join("timelines"), mode),
        RecordCodec::new(),
    )
}

pub fn photo_store(temp: &TempDir, mode: HandleMode) -> PhotoStore {
    PhotoStore::new(StoreHandle::new(temp.path().join("photos"), mode))
}

/// Timeline with dots `a`, `b`, `c`
pub fn abc_timeline(id: &str) -> Timeline {
    Timeline::new(id)
        .with_alias("Road trip")
        .with_dot("a", Dot::new("Leave home", 1.0, 1_600_000_000))
        .with_dot(
            "b",
            Dot::new("Mountain pass", 2.5, 1_600_050_000).with_description("snow on the road"),
        )
        .with_dot(
            "c",
            Dot::new("Arrive, über tired", 0.75, 1_600_090_000).with_photo("photo-c"),
        )
}
