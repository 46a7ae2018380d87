//! Pose and motion classifiers: width-checked views over shared models.

use crate::model::{Model, ModelError, Prediction};
use crate::normalize::LANDMARK_FEATURES;
use std::sync::Arc;

/// Static hand-pose classifier over a normalized landmark vector.
#[derive(Debug, Clone)]
pub struct PoseClassifier {
    model: Arc<Model>,
}

impl PoseClassifier {
    pub fn new(model: Arc<Model>) -> Result<Self, ModelError> {
        check_width(&model, LANDMARK_FEATURES)?;
        Ok(Self { model })
    }

    pub fn classify(&self, landmarks: &[f32]) -> Result<Prediction, ModelError> {
        self.model.evaluate(landmarks)
    }

    pub fn class_count(&self) -> usize {
        self.model.class_count()
    }
}

/// Finger-gesture classifier over a normalized point-history vector.
#[derive(Debug, Clone)]
pub struct MotionClassifier {
    model: Arc<Model>,
}

impl MotionClassifier {
    pub fn new(model: Arc<Model>, history_length: usize) -> Result<Self, ModelError> {
        check_width(&model, history_length * 2)?;
        Ok(Self { model })
    }

    pub fn classify(&self, trajectory: &[f32]) -> Result<Prediction, ModelError> {
        self.model.evaluate(trajectory)
    }

    pub fn class_count(&self) -> usize {
        self.model.class_count()
    }

    pub fn history_length(&self) -> usize {
        self.model.input_width() / 2
    }
}

fn check_width(model: &Model, expected: usize) -> Result<(), ModelError> {
    if model.input_width() != expected {
        return Err(ModelError::InputWidth {
            expected,
            got: model.input_width(),
        });
    }
    Ok(())
}
