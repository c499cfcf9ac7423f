//! Face mesh landmark set and the inference capability boundary

use crate::AttentionError;
use frame_capture::VideoFrame;
use serde::{Deserialize, Serialize};

/// Points in a refined face mesh (468 surface points + 10 iris points)
pub const MESH_POINTS: usize = 478;

/// Eye landmark indices, ordered corner / upper-outer / upper-inner /
/// corner / lower-inner / lower-outer
pub const LEFT_EYE: [usize; 6] = [33, 160, 158, 133, 153, 144];
pub const RIGHT_EYE: [usize; 6] = [362, 385, 387, 263, 373, 380];

/// Iris center indices (refined mesh only)
pub const LEFT_IRIS_CENTER: usize = 468;
pub const RIGHT_IRIS_CENTER: usize = 473;

/// Head pose indices: nose tip, eye corners, mouth corners, chin
pub const POSE_LANDMARKS: [usize; 6] = [1, 33, 263, 61, 291, 199];

/// One face's landmark positions, normalized to `[0, 1]` in both axes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandmarkSet {
    points: Vec<[f32; 2]>,
}

impl LandmarkSet {
    /// Build a landmark set, requiring the full refined mesh.
    pub fn from_points(points: Vec<[f32; 2]>) -> Result<Self, AttentionError> {
        if points.len() < MESH_POINTS {
            return Err(AttentionError::IncompleteLandmarks {
                expected: MESH_POINTS,
                got: points.len(),
            });
        }
        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Landmark position in pixel coordinates.
    pub fn point_px(&self, idx: usize, width: u32, height: u32) -> [f64; 2] {
        let [x, y] = self.points[idx];
        [x as f64 * width as f64, y as f64 * height as f64]
    }

    /// Six eye landmarks in pixel coordinates, in EAR order.
    pub fn eye_px(&self, indices: &[usize; 6], width: u32, height: u32) -> [[f64; 2]; 6] {
        indices.map(|i| self.point_px(i, width, height))
    }

    /// The six head-pose landmarks in pixel coordinates.
    pub fn pose_px(&self, width: u32, height: u32) -> [[f64; 2]; 6] {
        POSE_LANDMARKS.map(|i| self.point_px(i, width, height))
    }
}

/// Capability interface over landmark inference.
///
/// The core never touches a camera or a model directly; a provider turns a
/// frame into landmarks (or `None` when no face is found), which lets the
/// whole pipeline run against synthetic sequences in tests.
pub trait FaceLandmarker {
    fn detect(&mut self, frame: &VideoFrame) -> Option<LandmarkSet>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_set_rejected() {
        let err = LandmarkSet::from_points(vec![[0.5, 0.5]; 68]).unwrap_err();
        assert!(matches!(
            err,
            AttentionError::IncompleteLandmarks { got: 68, .. }
        ));
    }

    #[test]
    fn test_pixel_scaling() {
        let mut points = vec![[0.0, 0.0]; MESH_POINTS];
        points[1] = [0.5, 0.25];
        let set = LandmarkSet::from_points(points).unwrap();
        assert_eq!(set.point_px(1, 640, 480), [320.0, 120.0]);
    }
}
