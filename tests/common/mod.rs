#![allow(dead_code)]

use handsign::classifier::{MotionClassifier, PoseClassifier};
use handsign::config::PipelineSettings;
use handsign::input::{DetectedHand, Frame, Point};
use handsign::labels::LabelTable;
use handsign::model::{Activation, Dense, Model};
use handsign::pipeline::GesturePipeline;
use std::sync::Arc;
use tempfile::TempDir;

pub const POSE_LABELS: &str = "Open\nClose\nPointer\nOK\n";
pub const MOTION_LABELS: &str = "Stop\nClockwise\nCounter Clockwise\nMove\n";

/// Single linear layer that ignores its input and always picks `winner`.
pub fn constant_model(input_width: usize, classes: usize, winner: usize) -> Model {
    let rows = vec![vec![0.0; input_width]; classes];
    let mut bias = vec![0.0; classes];
    bias[winner] = 1.0;
    Model::new(input_width, vec![Dense::new(rows, bias, Activation::Softmax)]).unwrap()
}

/// Pose model over 4 classes: "Pointer" (2) when the index fingertip is
/// right of the wrist, "Open" (0) otherwise.
pub fn fingertip_pose_model() -> Model {
    let mut rows = vec![vec![0.0; 42]; 4];
    rows[2][16] = 1.0;
    let bias = vec![0.0, -1.0, 0.0, -1.0];
    Model::new(42, vec![Dense::new(rows, bias, Activation::Linear)]).unwrap()
}

pub fn pipeline_with(pose: Model, motion: Model, history_length: usize) -> GesturePipeline {
    let settings = PipelineSettings {
        history_length,
        ..PipelineSettings::default()
    };
    GesturePipeline::new(
        PoseClassifier::new(Arc::new(pose)).unwrap(),
        MotionClassifier::new(Arc::new(motion), history_length).unwrap(),
        LabelTable::parse(POSE_LABELS).unwrap(),
        LabelTable::parse(MOTION_LABELS).unwrap(),
        settings,
    )
    .unwrap()
}

/// 21 landmarks spread around `wrist` with the index fingertip at `tip`.
pub fn landmarks(wrist: Point, tip: Point) -> Vec<Point> {
    let mut pts: Vec<Point> = (0..21)
        .map(|i| Point::new(wrist.x + (i % 5) * 3, wrist.y - (i / 5) * 4))
        .collect();
    pts[0] = wrist;
    pts[8] = tip;
    pts
}

pub fn hand(handedness: &str, points: Vec<Point>) -> DetectedHand {
    DetectedHand {
        handedness: handedness.to_string(),
        landmarks: points,
    }
}

pub fn frame(hands: Vec<DetectedHand>) -> Frame {
    Frame {
        width: 640,
        height: 480,
        hands,
    }
}

/// Scratch directory removed when the returned guard is dropped.
pub fn scratch_dir(name: &str) -> TempDir {
    tempfile::Builder::new()
        .prefix(&format!("handsign-{name}-"))
        .tempdir()
        .unwrap()
}
