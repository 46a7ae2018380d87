//! Per-frame orchestration: normalize → classify pose → track fingertip →
//! classify motion → stabilize.

use anyhow::{Context, Result};
use log::{debug, info, trace, warn};
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;

use crate::classifier::{MotionClassifier, PoseClassifier};
use crate::config::{ConfigState, PipelineSettings};
use crate::input::{BoundingBox, Frame, LandmarkSet, Point};
use crate::labels::{LabelError, LabelTable};
use crate::model::{Model, ModelError};
use crate::normalize::{normalize_landmarks, normalize_trajectory};
use crate::stabilizer::NO_MOTION;
use crate::tracker::{HandTracker, PendingUpdate};

/// Motion label reported while no finger gesture is recognized.
pub const NO_MOTION_LABEL: &str = "none";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Labels(#[from] LabelError),
}

/// Everything downstream consumers get about one hand in one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandResult {
    pub handedness: String,
    pub pose_id: usize,
    pub pose_label: String,
    pub motion_id: usize,
    pub motion_label: String,
    pub bounding_box: BoundingBox,
}

impl HandResult {
    /// e.g. `Right hand, Pointer, finger gesture Clockwise`
    pub fn summary(&self) -> String {
        let mut s = format!("{} hand, {}", self.handedness, self.pose_label);
        if self.motion_id != NO_MOTION {
            s.push_str(", finger gesture ");
            s.push_str(&self.motion_label);
        }
        s
    }
}

/// A [`HandResult`] together with the features that produced it.
#[derive(Debug, Clone)]
pub struct HandObservation {
    pub result: HandResult,
    pub landmark_features: Vec<f32>,
    /// Present only when the point history was full this frame.
    pub trajectory_features: Option<Vec<f32>>,
    pub raw_motion: usize,
    pub tracked_point: Point,
}

struct PendingHand {
    key: String,
    handedness: String,
    update: PendingUpdate,
    pose_id: usize,
    bounding_box: BoundingBox,
    landmark_features: Vec<f32>,
    trajectory_features: Option<Vec<f32>>,
}

/// A tracked hand plus the frame it was last observed in.
struct HandStream {
    tracker: HandTracker,
    last_seen: u64,
}

/// Live streams are capped at `max_hands`; when a new hand appears, the
/// streams not observed for the longest are dropped first.
pub struct GesturePipeline {
    pose: PoseClassifier,
    motion: MotionClassifier,
    pose_labels: LabelTable,
    motion_labels: LabelTable,
    settings: PipelineSettings,
    streams: HashMap<String, HandStream>,
    frame_index: u64,
}

impl GesturePipeline {
    pub fn new(
        pose: PoseClassifier,
        motion: MotionClassifier,
        pose_labels: LabelTable,
        motion_labels: LabelTable,
        settings: PipelineSettings,
    ) -> Result<Self, PipelineError> {
        if motion.history_length() != settings.history_length {
            return Err(ModelError::InputWidth {
                expected: settings.history_length * 2,
                got: motion.history_length() * 2,
            }
            .into());
        }
        pose_labels.ensure_covers(pose.class_count())?;
        motion_labels.ensure_covers(motion.class_count())?;
        Ok(Self {
            pose,
            motion,
            pose_labels,
            motion_labels,
            settings,
            streams: HashMap::new(),
            frame_index: 0,
        })
    }

    /// Loads both models and label tables named by the config. Any missing
    /// or inconsistent artifact is an error.
    pub fn from_config(state: &ConfigState) -> Result<Self> {
        let settings = state.config.pipeline.clone();

        let pose_path = state.pose_model_path();
        let pose_model = Model::load(&pose_path)
            .with_context(|| format!("pose model {}", pose_path.display()))?;
        let motion_path = state.motion_model_path();
        let motion_model = Model::load(&motion_path)
            .with_context(|| format!("motion model {}", motion_path.display()))?;
        info!(
            "pose model: {} inputs, {} classes",
            pose_model.input_width(),
            pose_model.class_count()
        );
        info!(
            "motion model: {} inputs, {} classes",
            motion_model.input_width(),
            motion_model.class_count()
        );

        let pose = PoseClassifier::new(Arc::new(pose_model))
            .with_context(|| format!("pose model {}", pose_path.display()))?;
        let motion = MotionClassifier::new(Arc::new(motion_model), settings.history_length)
            .with_context(|| format!("motion model {}", motion_path.display()))?;

        let pose_labels_path = state.pose_labels_path();
        let pose_labels = LabelTable::load(&pose_labels_path)
            .with_context(|| format!("pose labels {}", pose_labels_path.display()))?;
        let motion_labels_path = state.motion_labels_path();
        let motion_labels = LabelTable::load(&motion_labels_path)
            .with_context(|| format!("motion labels {}", motion_labels_path.display()))?;

        Ok(Self::new(pose, motion, pose_labels, motion_labels, settings)?)
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn tracker(&self, key: &str) -> Option<&HandTracker> {
        self.streams.get(key).map(|s| &s.tracker)
    }

    /// Number of hand streams currently holding history.
    pub fn tracked_hands(&self) -> usize {
        self.streams.len()
    }

    /// Drops every hand's history; the next frame starts a new session.
    pub fn reset(&mut self) {
        self.streams.clear();
        self.frame_index = 0;
    }

    pub fn process_frame(&mut self, frame: &Frame) -> Result<Vec<HandResult>, ModelError> {
        Ok(self
            .observe(frame)?
            .into_iter()
            .map(|o| o.result)
            .collect())
    }

    /// Like [`process_frame`](Self::process_frame) but keeps the feature
    /// vectors. Hand state is only mutated once every hand in the frame has
    /// been classified; an error leaves all histories untouched.
    pub fn observe(&mut self, frame: &Frame) -> Result<Vec<HandObservation>, ModelError> {
        let size = match frame.size() {
            Ok(s) => s,
            Err(e) => {
                warn!("skipping frame: {e}");
                return Ok(Vec::new());
            }
        };
        if frame.hands.len() > self.settings.max_hands {
            debug!(
                "{} hands detected, processing the first {}",
                frame.hands.len(),
                self.settings.max_hands
            );
        }

        let mut pending: Vec<PendingHand> = Vec::new();
        for hand in frame.hands.iter().take(self.settings.max_hands) {
            let set = match LandmarkSet::within(hand.landmarks.clone(), size) {
                Ok(s) => s,
                Err(e) => {
                    warn!("skipping {} hand: {e}", hand.handedness);
                    continue;
                }
            };
            let key = hand_key(&hand.handedness, &pending);

            let landmark_features = normalize_landmarks(&set);
            let pose = self.pose.classify(&landmark_features)?;
            let point = if pose.class_id == self.settings.pointing_pose_id {
                set.index_fingertip()
            } else {
                Point::SENTINEL
            };

            let fresh: HandTracker;
            let tracker = match self.streams.get(&key) {
                Some(s) => &s.tracker,
                None => {
                    fresh = HandTracker::new(self.settings.history_length);
                    &fresh
                }
            };
            let (raw_motion, trajectory_features) = match tracker.window_with(point) {
                Some(window) => {
                    let features = normalize_trajectory(&window, size);
                    let id = self.motion.classify(&features)?.class_id;
                    (id, Some(features))
                }
                None => (NO_MOTION, None),
            };
            trace!(
                "{key}: pose={} ({:.2}) point={:?} raw_motion={raw_motion}",
                pose.class_id,
                pose.confidence(),
                point
            );

            pending.push(PendingHand {
                key,
                handedness: hand.handedness.clone(),
                update: PendingUpdate { point, raw_motion },
                pose_id: pose.class_id,
                bounding_box: set.bounding_box(),
                landmark_features,
                trajectory_features,
            });
        }

        self.frame_index += 1;
        self.evict_for(&pending);

        // streams not observed this frame still advance by one sentinel
        for (key, stream) in self.streams.iter_mut() {
            if !pending.iter().any(|p| &p.key == key) {
                stream.tracker.push_sentinel();
            }
        }

        let history_length = self.settings.history_length;
        let frame_index = self.frame_index;
        let mut out = Vec::with_capacity(pending.len());
        for p in pending {
            let stream = self.streams.entry(p.key).or_insert_with(|| HandStream {
                tracker: HandTracker::new(history_length),
                last_seen: frame_index,
            });
            stream.last_seen = frame_index;
            let motion_id = stream.tracker.commit(p.update);
            let result = HandResult {
                handedness: p.handedness,
                pose_id: p.pose_id,
                pose_label: self.pose_labels.get(p.pose_id).unwrap_or_default().to_string(),
                motion_id,
                motion_label: self.motion_label(motion_id),
                bounding_box: p.bounding_box,
            };
            out.push(HandObservation {
                result,
                landmark_features: p.landmark_features,
                trajectory_features: p.trajectory_features,
                raw_motion: p.update.raw_motion,
                tracked_point: p.update.point,
            });
        }
        Ok(out)
    }

    /// Makes room for the hands in `pending` that have no stream yet.
    fn evict_for(&mut self, pending: &[PendingHand]) {
        let new_streams = pending
            .iter()
            .filter(|p| !self.streams.contains_key(&p.key))
            .count();
        while self.streams.len() + new_streams > self.settings.max_hands {
            let stale = self
                .streams
                .iter()
                .filter(|(key, _)| !pending.iter().any(|p| &p.key == *key))
                .min_by(|a, b| a.1.last_seen.cmp(&b.1.last_seen).then(a.0.cmp(b.0)))
                .map(|(key, _)| key.clone());
            let Some(key) = stale else { break };
            debug!("dropping {key} hand stream");
            self.streams.remove(&key);
        }
    }

    fn motion_label(&self, id: usize) -> String {
        if id == NO_MOTION {
            return NO_MOTION_LABEL.to_string();
        }
        self.motion_labels.get(id).unwrap_or_default().to_string()
    }
}

/// Hands are keyed by handedness; a repeated label within one frame gets
/// an ordinal suffix so two "Right" hands never share a history.
fn hand_key(handedness: &str, pending: &[PendingHand]) -> String {
    let n = pending
        .iter()
        .filter(|p| p.handedness == handedness)
        .count();
    if n == 0 {
        handedness.to_string()
    } else {
        format!("{handedness}#{n}")
    }
}
