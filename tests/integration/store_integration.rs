use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use tempfile::TempDir;
use timeline::{Dot, HandleMode, StoreError, StoreErrorKind, Timeline};

use crate::integration::support::{abc_timeline, timeline_store};

#[test]
fn put_get_delete_dot_scenario() {
    for mode in [HandleMode::PerOperation, HandleMode::Persistent] {
        let temp = TempDir::new().unwrap();
        let store = timeline_store(&temp, mode);

        let timeline = Timeline::new("t1").with_dot("d1", Dot::new("A", 1.0, 100));
        store.put("t1", &timeline).unwrap();

        let read = store.get("t1").unwrap();
        assert_eq!(read.dots["d1"].title, "A");
        assert_eq!(read.dots["d1"].size, 1.0);
        assert_eq!(read.dots["d1"].epoch, 100);

        store.delete_dot("t1", "d1").unwrap();
        let read = store.get("t1").unwrap();
        assert!(read.dots.is_empty(), "mode {mode:?}");
        assert!(store.contains("t1").unwrap());
    }
}

#[test]
fn data_survives_a_fresh_store_instance() {
    let temp = TempDir::new().unwrap();
    {
        let store = timeline_store(&temp, HandleMode::Persistent);
        store.put("t1", &abc_timeline("t1")).unwrap();
        store.handle().close().unwrap();
    }

    let reopened = timeline_store(&temp, HandleMode::PerOperation);
    assert_eq!(reopened.get("t1").unwrap(), abc_timeline("t1"));
}

#[test]
fn delete_whole_twice_then_not_found() {
    let temp = TempDir::new().unwrap();
    let store = timeline_store(&temp, HandleMode::PerOperation);
    store.put("t1", &abc_timeline("t1")).unwrap();

    store.delete_whole("t1").unwrap();
    store.delete_whole("t1").unwrap();
    assert_eq!(
        store.get("t1").unwrap_err().kind(),
        StoreErrorKind::NotFound
    );
    assert_eq!(
        store.delete_dot("t1", "a").unwrap_err().kind(),
        StoreErrorKind::NotFound
    );
}

#[test]
fn fold_visits_exactly_the_stored_timelines() {
    let temp = TempDir::new().unwrap();
    let store = timeline_store(&temp, HandleMode::PerOperation);

    let mut expected = BTreeMap::new();
    for i in 0..25 {
        let id = format!("timeline-{i:02}");
        let timeline = Timeline::new(id.clone())
            .with_dot(format!("d{i}"), Dot::new(format!("Dot {i}"), i as f64 / 2.0, i));
        store.put(&id, &timeline).unwrap();
        expected.insert(id, timeline);
    }
    // Overwrites must not produce extra entries
    store.put("timeline-03", &expected["timeline-03"]).unwrap();

    let mut visited = BTreeMap::new();
    store
        .fold(|key, value| {
            let id = String::from_utf8(key.to_vec()).unwrap();
            let timeline = store.codec().decode(value)?;
            assert!(visited.insert(id, timeline).is_none(), "key visited twice");
            Ok::<_, StoreError>(())
        })
        .unwrap();

    assert_eq!(visited, expected);
    assert_eq!(store.ids().unwrap(), expected.keys().cloned().collect::<Vec<_>>());
}

#[test]
fn concurrent_writers_to_different_timelines_do_not_interfere() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(timeline_store(&temp, HandleMode::PerOperation));

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for n in 0..5 {
                    let id = format!("w{worker}-{n}");
                    store.put(&id, &abc_timeline(&id)).unwrap();
                    store.delete_dot(&id, "b").unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let ids = store.ids().unwrap();
    assert_eq!(ids.len(), 40);
    for id in ids {
        let timeline = store.get(&id).unwrap();
        let dots: Vec<_> = timeline.dots.keys().cloned().collect();
        assert_eq!(dots, vec!["a".to_string(), "c".to_string()]);
    }
}

#[test]
fn persistent_mode_serves_concurrent_readers() {
    let temp = TempDir::new().unwrap();
    let store = timeline_store(&temp, HandleMode::Persistent);
    store.put("shared", &abc_timeline("shared")).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            thread::spawn(move || store.get("shared").unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), abc_timeline("shared"));
    }
}

#[test]
fn compaction_keeps_latest_values() {
    let temp = TempDir::new().unwrap();
    let store = timeline_store(&temp, HandleMode::PerOperation);

    for round in 0..20 {
        let timeline = Timeline::new("t1").with_dot("d", Dot::new(format!("round {round}"), 1.0, round));
        store.put("t1", &timeline).unwrap();
    }
    store.put("t2", &abc_timeline("t2")).unwrap();
    store.put("gone", &abc_timeline("gone")).unwrap();
    store.delete_whole("gone").unwrap();

    let report = store.compact().unwrap();
    assert_eq!(report.entries, 2);

    assert_eq!(store.get("t1").unwrap().dots["d"].title, "round 19");
    assert_eq!(store.get("t2").unwrap(), abc_timeline("t2"));
    assert!(store.get("gone").unwrap_err().is_not_found());
}

#[test]
fn second_handle_on_open_directory_is_unavailable() {
    let temp = TempDir::new().unwrap();
    let holder = timeline_store(&temp, HandleMode::Persistent);
    holder.put("t1", &abc_timeline("t1")).unwrap();
    assert!(holder.handle().is_open());

    let intruder = timeline_store(&temp, HandleMode::PerOperation);
    let err = intruder.get("t1").unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::Unavailable);
    assert!(err.is_retryable());

    holder.handle().close().unwrap();
    assert_eq!(intruder.get("t1").unwrap(), abc_timeline("t1"));
}
