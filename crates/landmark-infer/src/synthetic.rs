//! Deterministic synthetic face landmarks
//!
//! A neutral frontal face: eyes open (EAR ~0.30), gaze centered, head pose
//! landmarks placed at exact projections of the generic face template so the
//! pose solver converges to near-zero angles.

use attention_core::landmarks::{
    LEFT_EYE, LEFT_IRIS_CENTER, MESH_POINTS, RIGHT_EYE, RIGHT_IRIS_CENTER,
};
use attention_core::LandmarkSet;

/// Horizontal eye span, normalized
const EYE_SPAN: f32 = 0.06;
/// Eye line height, normalized
const EYE_Y: f32 = 0.375;
/// Left corners of the two eyes (matching the projected eye-corner pose
/// landmarks at indices 33 and 263)
const LEFT_EYE_X: f32 = 0.40625;
const RIGHT_EYE_X: f32 = 0.53375;
/// Neutral open-eye aspect ratio
const NEUTRAL_EAR: f32 = 0.30;

fn place_eye(points: &mut [[f32; 2]], indices: &[usize; 6], left_x: f32) {
    let dy = 0.04 * NEUTRAL_EAR;
    points[indices[0]] = [left_x, EYE_Y];
    points[indices[3]] = [left_x + EYE_SPAN, EYE_Y];
    points[indices[1]] = [left_x + 0.02, EYE_Y - dy];
    points[indices[2]] = [left_x + 0.04, EYE_Y - dy];
    points[indices[4]] = [left_x + 0.04, EYE_Y + dy];
    points[indices[5]] = [left_x + 0.02, EYE_Y + dy];
}

/// A full refined-mesh landmark set for a neutral, attentive face.
pub fn synthetic_neutral_face() -> LandmarkSet {
    let mut points = vec![[0.5f32, 0.5f32]; MESH_POINTS];

    // Pose landmarks: nose tip, mouth corners, chin (the eye corners are
    // placed by place_eye below)
    points[1] = [0.5, 0.5];
    points[61] = [0.40625, 0.625];
    points[291] = [0.59375, 0.625];
    points[199] = [0.5, 368.0 / 480.0];

    place_eye(&mut points, &LEFT_EYE, LEFT_EYE_X);
    place_eye(&mut points, &RIGHT_EYE, RIGHT_EYE_X);

    points[LEFT_IRIS_CENTER] = [LEFT_EYE_X + EYE_SPAN / 2.0, EYE_Y];
    points[RIGHT_IRIS_CENTER] = [RIGHT_EYE_X + EYE_SPAN / 2.0, EYE_Y];

    LandmarkSet::from_points(points).expect("mesh point count is fixed")
}
