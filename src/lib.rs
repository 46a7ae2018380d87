//! Hand gesture recognition from per-frame skeleton landmarks.
//!
//! Each frame's landmarks are normalized and classified into a static pose;
//! while a hand points, its index fingertip is tracked and the trajectory is
//! classified into a finger gesture, smoothed by a majority vote over the
//! last few frames.

pub mod classifier;
pub mod config;
pub mod dataset;
pub mod input;
pub mod labels;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod session;
pub mod stabilizer;
pub mod tracker;

pub use classifier::{MotionClassifier, PoseClassifier};
pub use input::{BoundingBox, Frame, FrameSize, LandmarkSet, Point};
pub use labels::LabelTable;
pub use model::{Model, Prediction};
pub use pipeline::{GesturePipeline, HandResult};
