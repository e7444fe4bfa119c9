use std::fs;

use tempfile::TempDir;
use timeline::config::{StorageConfig, TimelineConfig};
use timeline::tooling::cli::{CliContext, Commands, PhotoCommands};
use timeline::ApiError;

fn context(temp: &TempDir) -> CliContext {
    let config = TimelineConfig {
        storage: StorageConfig {
            timelines_path: Some(temp.path().join("timelines")),
            photos_path: Some(temp.path().join("photos")),
            ..StorageConfig::default()
        },
        ..TimelineConfig::default()
    };
    CliContext::from_config(config).unwrap()
}

fn json(output: &str) -> serde_json::Value {
    serde_json::from_str(output).unwrap()
}

#[test]
fn put_get_del_dot_round_trip_through_cli() {
    let temp = TempDir::new().unwrap();
    let cli = context(&temp);
    let body = temp.path().join("t1.json");
    fs::write(
        &body,
        r#"{"alias": "Trip", "dots": {
            "d1": {"title": "A", "size": 1.0, "epoch": 100},
            "d2": {"title": "B", "descr": "second", "photo_id": "p2", "size": 2.0, "epoch": 200}
        }}"#,
    )
    .unwrap();

    let out = cli
        .execute(&Commands::Put {
            id: "t1".to_string(),
            file: Some(body),
        })
        .unwrap();
    assert_eq!(json(&out)["ok"], true);

    let out = cli
        .execute(&Commands::Get {
            id: "t1".to_string(),
            format: "json".to_string(),
        })
        .unwrap();
    let parsed = json(&out);
    assert_eq!(parsed["ok"], true);
    assert_eq!(parsed["timeline_content"]["timelineID"], "t1");
    assert_eq!(parsed["timeline_content"]["dots"]["d2"]["descr"], "second");

    cli.execute(&Commands::DelDot {
        id: "t1".to_string(),
        dot_id: "d1".to_string(),
    })
    .unwrap();
    let timeline = cli.timelines().get("t1").unwrap();
    assert_eq!(timeline.dots.keys().collect::<Vec<_>>(), vec!["d2"]);

    let text = cli
        .execute(&Commands::Get {
            id: "t1".to_string(),
            format: "text".to_string(),
        })
        .unwrap();
    assert!(text.contains("Timeline t1 (Trip)"));
    assert!(text.contains("1970-01-01T00:03:20+00:00"));
}

#[test]
fn empty_id_is_rejected_before_touching_the_store() {
    let temp = TempDir::new().unwrap();
    let cli = context(&temp);

    let err = cli
        .execute(&Commands::Del { id: String::new() })
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(ref m) if m == "no ID provided"));
    assert!(!temp.path().join("timelines").exists());
}

#[test]
fn get_missing_timeline_reports_not_found() {
    let temp = TempDir::new().unwrap();
    let cli = context(&temp);

    let err = cli
        .execute(&Commands::Get {
            id: "missing".to_string(),
            format: "json".to_string(),
        })
        .unwrap_err();
    match err {
        ApiError::StorageError(inner) => assert!(inner.is_not_found()),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_json_is_invalid_input() {
    let temp = TempDir::new().unwrap();
    let cli = context(&temp);
    let body = temp.path().join("bad.json");
    fs::write(&body, "{not json").unwrap();

    let err = cli
        .execute(&Commands::Put {
            id: "t1".to_string(),
            file: Some(body),
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[test]
fn photo_commands_and_listing() {
    let temp = TempDir::new().unwrap();
    let cli = context(&temp);
    let source = temp.path().join("in.jpg");
    let dest = temp.path().join("out.jpg");
    fs::write(&source, [0xffu8, 0xd8, 0xff, 0xe0]).unwrap();

    cli.execute(&Commands::Photo {
        command: PhotoCommands::Put {
            id: "p1".to_string(),
            file: source,
        },
    })
    .unwrap();
    cli.execute(&Commands::Photo {
        command: PhotoCommands::Get {
            id: "p1".to_string(),
            out: dest.clone(),
        },
    })
    .unwrap();
    assert_eq!(fs::read(&dest).unwrap(), vec![0xff, 0xd8, 0xff, 0xe0]);

    let out = cli
        .execute(&Commands::List {
            photos: true,
            format: "json".to_string(),
        })
        .unwrap();
    let parsed = json(&out);
    assert_eq!(parsed["entries"][0]["id"], "p1");
    assert_eq!(parsed["entries"][0]["bytes"], 4);

    cli.execute(&Commands::Photo {
        command: PhotoCommands::Del {
            id: "p1".to_string(),
        },
    })
    .unwrap();
    let text = cli
        .execute(&Commands::List {
            photos: true,
            format: "text".to_string(),
        })
        .unwrap();
    assert_eq!(text, "No photos stored\n");
}

#[test]
fn compact_and_config_commands() {
    let temp = TempDir::new().unwrap();
    let cli = context(&temp);
    cli.timelines()
        .put("t1", &timeline::Timeline::new("t1"))
        .unwrap();

    let out = cli.execute(&Commands::Compact { photos: false }).unwrap();
    let parsed = json(&out);
    assert_eq!(parsed["ok"], true);
    assert_eq!(parsed["entries"], 1);

    let config = cli.execute(&Commands::Config).unwrap();
    assert!(config.contains("handle_mode = \"per_operation\""));
    assert!(config.contains("[logging]"));
}
