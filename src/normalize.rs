//! Feature extraction: landmark and trajectory normalization.

use crate::input::{FrameSize, LandmarkSet, Point};

/// Width of a normalized landmark vector (x,y per landmark).
pub const LANDMARK_FEATURES: usize = crate::input::LANDMARK_COUNT * 2;

/// Translates every landmark relative to the wrist, flattens to
/// `x0,y0,x1,y1,…` and scales by the largest absolute component.
///
/// A fully collapsed hand (every point on the wrist) yields the zero vector.
pub fn normalize_landmarks(set: &LandmarkSet) -> Vec<f32> {
    let base = set.wrist();
    let flat: Vec<f32> = set
        .points()
        .iter()
        .flat_map(|p| [(p.x - base.x) as f32, (p.y - base.y) as f32])
        .collect();

    let max = flat.iter().fold(0.0f32, |m, v| m.max(v.abs()));
    if max == 0.0 {
        return vec![0.0; flat.len()];
    }
    flat.into_iter().map(|v| v / max).collect()
}

/// Translates a point history relative to its first entry and scales x by
/// frame width, y by frame height. Output length is `2 * points.len()`.
pub fn normalize_trajectory(points: &[Point], size: FrameSize) -> Vec<f32> {
    let Some(base) = points.first().copied() else {
        return Vec::new();
    };
    let w = size.width as f32;
    let h = size.height as f32;
    points
        .iter()
        .flat_map(|p| [(p.x - base.x) as f32 / w, (p.y - base.y) as f32 / h])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(points: Vec<Point>) -> LandmarkSet {
        LandmarkSet::new(points).unwrap()
    }

    #[test]
    fn collapsed_hand_is_zero_vector() {
        let v = normalize_landmarks(&set(vec![Point::new(7, 9); 21]));
        assert_eq!(v, vec![0.0; LANDMARK_FEATURES]);
    }

    #[test]
    fn interleaved_layout() {
        let mut pts = vec![Point::new(0, 0); 21];
        pts[1] = Point::new(4, -2);
        let v = normalize_landmarks(&set(pts));
        assert_eq!(&v[..4], &[0.0, 0.0, 1.0, -0.5]);
    }

    #[test]
    fn trajectory_uses_aspect_ratio() {
        let size = FrameSize::new(200, 100).unwrap();
        let v = normalize_trajectory(&[Point::new(10, 10), Point::new(30, 30)], size);
        assert_eq!(v, vec![0.0, 0.0, 0.1, 0.2]);
    }

    #[test]
    fn empty_trajectory() {
        let size = FrameSize::new(640, 480).unwrap();
        assert!(normalize_trajectory(&[], size).is_empty());
    }
}
