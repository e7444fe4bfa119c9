use tempfile::TempDir;
use timeline::{HandleMode, StoreError, StoreErrorKind};

use crate::integration::support::{abc_timeline, photo_store, timeline_store};

#[test]
fn photos_and_timelines_live_in_separate_stores() {
    let temp = TempDir::new().unwrap();
    let timelines = timeline_store(&temp, HandleMode::PerOperation);
    let photos = photo_store(&temp, HandleMode::PerOperation);

    let timeline = abc_timeline("t1");
    let photo_id = timeline.dots["c"].photo_id.clone().unwrap();
    timelines.put("t1", &timeline).unwrap();
    photos.put(&photo_id, b"\x89PNG\r\n\x1a\nfake").unwrap();

    assert_eq!(photos.get(&photo_id).unwrap(), b"\x89PNG\r\n\x1a\nfake".to_vec());
    assert_eq!(
        photos.get("t1").unwrap_err().kind(),
        StoreErrorKind::NotFound
    );
    assert_eq!(
        timelines.get(&photo_id).unwrap_err().kind(),
        StoreErrorKind::NotFound
    );
}

#[test]
fn photo_put_overwrites_and_fold_sees_each_once() {
    let temp = TempDir::new().unwrap();
    let photos = photo_store(&temp, HandleMode::Persistent);

    photos.put("p1", b"first").unwrap();
    photos.put("p1", b"second, longer").unwrap();
    photos.put("p2", &[0u8; 1024]).unwrap();

    let mut seen = Vec::new();
    photos
        .fold(|key, value| {
            seen.push((key.to_vec(), value.len()));
            Ok::<_, StoreError>(())
        })
        .unwrap();
    assert_eq!(
        seen,
        vec![(b"p1".to_vec(), 14), (b"p2".to_vec(), 1024)]
    );
}
