//! Detector input: frames of hand landmarks in pixel space (JSON lines).

use serde::{Deserialize, Serialize};
use std::io::BufRead;
use thiserror::Error;

/// Landmarks per detected hand.
pub const LANDMARK_COUNT: usize = 21;
/// Wrist; every landmark is expressed relative to it.
pub const WRIST: usize = 0;
/// Index fingertip, the point tracked while the hand is pointing.
pub const INDEX_FINGERTIP: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("expected 21 landmarks, got {got}")]
    LandmarkCount { got: usize },
    #[error("landmark {index} at ({x}, {y}) is outside the {width}x{height} frame")]
    LandmarkOutOfFrame {
        index: usize,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    #[error("invalid frame size {width}x{height}")]
    FrameSize { width: u32, height: u32 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// "No tracked point this frame."
    pub const SENTINEL: Point = Point { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }
}

impl From<[i32; 2]> for Point {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [i32; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::FrameSize { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && (p.x as u32) < self.width && (p.y as u32) < self.height
    }
}

/// Exactly [`LANDMARK_COUNT`] points in anatomical order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandmarkSet([Point; LANDMARK_COUNT]);

impl LandmarkSet {
    pub fn new(points: Vec<Point>) -> Result<Self, FrameError> {
        let got = points.len();
        let arr: [Point; LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| FrameError::LandmarkCount { got })?;
        Ok(Self(arr))
    }

    /// Like [`new`](Self::new), and every point must lie in
    /// `[0, width) x [0, height)`.
    pub fn within(points: Vec<Point>, size: FrameSize) -> Result<Self, FrameError> {
        let set = Self::new(points)?;
        if let Some((index, p)) = set
            .0
            .iter()
            .enumerate()
            .find(|(_, p)| !size.contains(**p))
        {
            return Err(FrameError::LandmarkOutOfFrame {
                index,
                x: p.x,
                y: p.y,
                width: size.width,
                height: size.height,
            });
        }
        Ok(set)
    }

    pub fn points(&self) -> &[Point; LANDMARK_COUNT] {
        &self.0
    }

    pub fn wrist(&self) -> Point {
        self.0[WRIST]
    }

    pub fn index_fingertip(&self) -> Point {
        self.0[INDEX_FINGERTIP]
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::around(&self.0)
    }
}

/// Axis-aligned box over a hand. `x_max`/`y_max` are exclusive, one past the
/// outermost landmark pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl BoundingBox {
    pub fn around(points: &[Point]) -> Self {
        let Some(first) = points.first() else {
            return BoundingBox {
                x_min: 0,
                y_min: 0,
                x_max: 0,
                y_max: 0,
            };
        };
        let mut bb = BoundingBox {
            x_min: first.x,
            y_min: first.y,
            x_max: first.x,
            y_max: first.y,
        };
        for p in points {
            bb.x_min = bb.x_min.min(p.x);
            bb.y_min = bb.y_min.min(p.y);
            bb.x_max = bb.x_max.max(p.x);
            bb.y_max = bb.y_max.max(p.y);
        }
        bb.x_max = bb.x_max.saturating_add(1);
        bb.y_max = bb.y_max.saturating_add(1);
        bb
    }
}

fn unknown_handedness() -> String {
    "Unknown".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectedHand {
    #[serde(default = "unknown_handedness")]
    pub handedness: String,
    pub landmarks: Vec<Point>,
}

/// One detector frame: zero or more hands plus the image dimensions.
#[derive(Debug, Clone, Deserialize)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub hands: Vec<DetectedHand>,
}

impl Frame {
    pub fn size(&self) -> Result<FrameSize, FrameError> {
        FrameSize::new(self.width, self.height)
    }
}

/// Parses one JSON frame per non-blank line. Each line fails independently.
pub fn read_frames<R: BufRead>(reader: R) -> impl Iterator<Item = anyhow::Result<Frame>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| match line {
            Ok(l) if l.trim().is_empty() => None,
            Ok(l) => Some(
                serde_json::from_str::<Frame>(&l)
                    .map_err(|e| anyhow::anyhow!("line {}: bad frame: {e}", idx + 1)),
            ),
            Err(e) => Some(Err(anyhow::anyhow!("line {}: read failed: {e}", idx + 1))),
        })
}
