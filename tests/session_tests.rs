mod common;

use common::*;
use handsign::config::ConfigState;
use handsign::dataset::{DatasetKind, DatasetWriter};
use handsign::input::Point;
use handsign::pipeline::GesturePipeline;
use handsign::session::{OutputMode, run_session};
use std::{
    fs,
    path::Path,
    sync::{Arc, atomic::AtomicBool},
};

fn model_json(input_width: usize, classes: usize, winner: usize) -> String {
    let rows = vec![vec![0.0f32; input_width]; classes];
    let mut bias = vec![0.0f32; classes];
    bias[winner] = 1.0;
    serde_json::json!({
        "input_width": input_width,
        "layers": [{"weights": rows, "bias": bias, "activation": "softmax"}]
    })
    .to_string()
}

fn write_artifacts(dir: &Path, history_length: usize) {
    let model = dir.join("model");
    fs::create_dir_all(&model).unwrap();
    fs::write(model.join("keypoint_classifier.json"), model_json(42, 4, 2)).unwrap();
    fs::write(
        model.join("point_history_classifier.json"),
        model_json(history_length * 2, 4, 3),
    )
    .unwrap();
    fs::write(
        model.join("keypoint_classifier_label.csv"),
        format!("\u{feff}{POSE_LABELS}"),
    )
    .unwrap();
    fs::write(model.join("point_history_classifier_label.csv"), MOTION_LABELS).unwrap();
    fs::write(
        dir.join("config.toml"),
        format!(
            r#"
[meta]
name = "test"

[pipeline]
history_length = {history_length}

[models]
pose = "model/keypoint_classifier.json"
motion = "model/point_history_classifier.json"

[labels]
pose = "model/keypoint_classifier_label.csv"
motion = "model/point_history_classifier_label.csv"
"#
        ),
    )
    .unwrap();
}

fn frame_line(tip: Point) -> String {
    let lm: Vec<[i32; 2]> = landmarks(Point::new(50, 60), tip)
        .into_iter()
        .map(Into::into)
        .collect();
    serde_json::json!({
        "width": 640,
        "height": 480,
        "hands": [{"handedness": "Right", "landmarks": lm}]
    })
    .to_string()
}

#[test]
fn pipeline_loads_from_config_dir() {
    let dir = scratch_dir("load");
    write_artifacts(dir.path(), 4);
    let cfg = ConfigState::load(&dir.path().join("config.toml")).unwrap();
    assert_eq!(cfg.name(), "test");
    let p = GesturePipeline::from_config(&cfg).unwrap();
    assert_eq!(p.settings().history_length, 4);
}

#[test]
fn missing_model_is_fatal() {
    let dir = scratch_dir("missing");
    write_artifacts(dir.path(), 4);
    fs::remove_file(dir.path().join("model/point_history_classifier.json")).unwrap();
    let cfg = ConfigState::load(&dir.path().join("config.toml")).unwrap();
    let err = GesturePipeline::from_config(&cfg).err().unwrap();
    assert!(format!("{err:#}").contains("point_history_classifier.json"));
}

#[test]
fn model_width_must_match_config() {
    let dir = scratch_dir("width");
    write_artifacts(dir.path(), 4);
    fs::write(
        dir.path().join("model/point_history_classifier.json"),
        model_json(32, 4, 3),
    )
    .unwrap();
    let cfg = ConfigState::load(&dir.path().join("config.toml")).unwrap();
    assert!(GesturePipeline::from_config(&cfg).is_err());
}

#[test]
fn session_streams_json_reports() {
    let dir = scratch_dir("session");
    write_artifacts(dir.path(), 4);
    let cfg = ConfigState::load(&dir.path().join("config.toml")).unwrap();
    let mut p = GesturePipeline::from_config(&cfg).unwrap();

    let mut input = String::new();
    for x in 0..6 {
        input.push_str(&frame_line(Point::new(70 + x, 20)));
        input.push('\n');
    }
    input.push_str("{ broken\n");
    input.push_str("{\"width\":640,\"height\":480,\"hands\":[]}\n");

    let stop = Arc::new(AtomicBool::new(false));
    let mut out = Vec::new();
    let stats = run_session(
        &mut p,
        input.as_bytes(),
        &mut out,
        OutputMode::Json,
        None::<&mut DatasetWriter<Vec<u8>>>,
        &stop,
    )
    .unwrap();
    assert_eq!(stats.frames, 7);
    assert_eq!(stats.skipped_lines, 1);
    assert_eq!(stats.hands, 6);

    let lines: Vec<serde_json::Value> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 7);
    assert_eq!(lines[0]["frame"], 0);
    assert_eq!(lines[0]["hands"][0]["pose_label"], "Pointer");
    assert_eq!(lines[0]["hands"][0]["motion_label"], "none");
    // raw motion 3 from frame 4 on; the vote flips once it holds the window
    assert_eq!(lines[5]["hands"][0]["motion_label"], "Move");
    assert_eq!(lines[6]["hands"].as_array().map(Vec::len), Some(0));
}

#[test]
fn session_text_mode_and_recording() {
    let dir = scratch_dir("record");
    write_artifacts(dir.path(), 4);
    let cfg = ConfigState::load(&dir.path().join("config.toml")).unwrap();
    let mut p = GesturePipeline::from_config(&cfg).unwrap();

    let mut input = String::new();
    for x in 0..5 {
        input.push_str(&frame_line(Point::new(70 + x, 20)));
        input.push('\n');
    }
    input.push_str("{\"width\":640,\"height\":480}\n");

    let mut rec = DatasetWriter::new(Vec::new(), DatasetKind::Motion, 4).unwrap();
    let mut out = Vec::new();
    let stop = Arc::new(AtomicBool::new(false));
    let stats = run_session(
        &mut p,
        input.as_bytes(),
        &mut out,
        OutputMode::Text,
        Some(&mut rec),
        &stop,
    )
    .unwrap();

    // frames 4 and 5 have a full history
    assert_eq!(stats.recorded_rows, 2);
    let rows = String::from_utf8(rec.into_inner()).unwrap();
    let first: Vec<&str> = rows.lines().next().unwrap().split(',').collect();
    assert_eq!(first[0], "4");
    assert_eq!(first.len(), 1 + 8);

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Right hand, Pointer");
    assert_eq!(lines.last().copied(), Some("No hand detected"));
}

#[test]
fn raised_stop_flag_ends_before_first_frame() {
    let dir = scratch_dir("stop");
    write_artifacts(dir.path(), 4);
    let cfg = ConfigState::load(&dir.path().join("config.toml")).unwrap();
    let mut p = GesturePipeline::from_config(&cfg).unwrap();

    let input = format!("{}\n", frame_line(Point::new(70, 20)));
    let stop = Arc::new(AtomicBool::new(true));
    let mut out = Vec::new();
    let stats = run_session(
        &mut p,
        input.as_bytes(),
        &mut out,
        OutputMode::Json,
        None::<&mut DatasetWriter<Vec<u8>>>,
        &stop,
    )
    .unwrap();
    assert_eq!(stats.frames, 0);
    assert!(out.is_empty());
    assert!(p.tracker("Right").is_none());
}

#[test]
fn scratch_dirs_are_cleaned_up() {
    let dir = scratch_dir("cleanup");
    write_artifacts(dir.path(), 4);
    let path = dir.path().to_path_buf();
    assert!(path.join("config.toml").exists());
    drop(dir);
    assert!(!path.exists());
}
