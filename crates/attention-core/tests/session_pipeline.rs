//! End-to-end session tests over synthetic landmark sequences
//!
//! Frames are fabricated at 16 fps with controllable EAR and gaze; the head
//! pose landmarks are exact projections of the generic face template at a
//! frontal pose, so the pose stage converges and stays unflagged.

use attention_core::landmarks::{
    LEFT_EYE, LEFT_IRIS_CENTER, MESH_POINTS, RIGHT_EYE, RIGHT_IRIS_CENTER,
};
use attention_core::{
    AttentionConfig, AttentionEvent, AttentionState, DetectionSession, FrameInput, LandmarkSet,
};

const W: u32 = 640;
const H: u32 = 480;
const DT: f64 = 1.0 / 16.0;
const EYE_SPAN: f64 = 0.06;

/// Normalized eye landmarks producing exactly the requested EAR in pixel
/// space (span 0.06 of the width; vertical offsets derived from the 640x480
/// frame geometry).
fn set_eye(points: &mut [[f32; 2]], indices: &[usize; 6], left_x: f64, y: f64, ear: f64) {
    let dy = 0.04 * ear;
    points[indices[0]] = [left_x as f32, y as f32];
    points[indices[3]] = [(left_x + EYE_SPAN) as f32, y as f32];
    points[indices[1]] = [(left_x + 0.02) as f32, (y - dy) as f32];
    points[indices[2]] = [(left_x + 0.04) as f32, (y - dy) as f32];
    points[indices[4]] = [(left_x + 0.04) as f32, (y + dy) as f32];
    points[indices[5]] = [(left_x + 0.02) as f32, (y + dy) as f32];
}

fn face(ear: f64, gaze: f64) -> LandmarkSet {
    let mut points = vec![[0.5f32, 0.5f32]; MESH_POINTS];

    // Frontal projections of the generic face template (focal = 640,
    // principal point at frame center, template 350 units from the camera):
    // nose tip, mouth corners, chin. The eye-corner projections double as
    // the EAR corner points below.
    points[1] = [0.5, 0.5];
    points[61] = [0.40625, 0.625];
    points[291] = [0.59375, 0.625];
    points[199] = [0.5, 368.0 / 480.0];

    set_eye(&mut points, &LEFT_EYE, 0.40625, 0.375, ear);
    set_eye(&mut points, &RIGHT_EYE, 0.53375, 0.375, ear);

    points[LEFT_IRIS_CENTER] = [(0.40625 + gaze * EYE_SPAN) as f32, 0.375];
    points[RIGHT_IRIS_CENTER] = [(0.53375 + gaze * EYE_SPAN) as f32, 0.375];

    LandmarkSet::from_points(points).unwrap()
}

fn input(ear: f64, gaze: f64) -> FrameInput {
    FrameInput {
        landmarks: Some(face(ear, gaze)),
        width: W,
        height: H,
        brightness: 128.0,
    }
}

fn no_face() -> FrameInput {
    FrameInput {
        landmarks: None,
        width: W,
        height: H,
        brightness: 128.0,
    }
}

fn session() -> DetectionSession {
    DetectionSession::new(AttentionConfig::default()).unwrap()
}

#[test]
fn blink_is_counted_rated_and_recorded() {
    let mut s = session();
    let mut t = 0.0;

    for _ in 0..16 {
        let r = s.process_frame(&input(0.30, 0.5), t);
        assert_eq!(r.sample.attention_state, AttentionState::Attentive);
        t += DT;
    }

    // 4 closed frames: a 0.25 s closure once the smoothed signal crosses
    for _ in 0..4 {
        s.process_frame(&input(0.10, 0.5), t);
        t += DT;
    }

    let mut blink_events = Vec::new();
    let mut last = None;
    for _ in 0..16 {
        let r = s.process_frame(&input(0.30, 0.5), t);
        t += DT;
        blink_events.extend(
            r.events
                .iter()
                .filter(|e| matches!(e, AttentionEvent::BlinkDetected { .. }))
                .cloned(),
        );
        last = Some(r.sample);
    }

    assert_eq!(s.blink_total(), 1);
    assert_eq!(
        blink_events,
        vec![AttentionEvent::BlinkDetected {
            blink_total: 1,
            duration_ms: 250.0
        }]
    );

    let sample = last.unwrap();
    assert_eq!(sample.blink_rate, 1);
    assert!((sample.closure_duration_ms - 250.0).abs() < 1e-6);
}

#[test]
fn long_closure_reads_drowsy_and_is_not_a_blink() {
    let mut s = session();
    let mut t = 0.0;

    for _ in 0..16 {
        s.process_frame(&input(0.30, 0.5), t);
        t += DT;
    }

    // 15 closed frames = 0.9375 s measured closure
    let mut saw_drowsy = false;
    let mut saw_sleeping = false;
    for _ in 0..15 {
        let r = s.process_frame(&input(0.10, 0.5), t);
        t += DT;
        saw_drowsy |= r.sample.attention_state == AttentionState::Drowsy;
        saw_sleeping |= r.sample.attention_state == AttentionState::Sleeping;
    }

    let mut closure_events = Vec::new();
    let mut last = None;
    for _ in 0..8 {
        let r = s.process_frame(&input(0.30, 0.5), t);
        t += DT;
        saw_drowsy |= r.sample.attention_state == AttentionState::Drowsy;
        closure_events.extend(r.events.clone());
        last = Some(r.sample);
    }

    assert!(saw_drowsy, "live state never read Drowsy during the closure");
    assert!(!saw_sleeping, "0.94 s closure must not reach Sleeping");
    assert_eq!(s.blink_total(), 0, "long closure counted as a blink");

    assert!(closure_events
        .iter()
        .any(|e| matches!(e, AttentionEvent::ClosureEnded { duration_ms } if (*duration_ms - 937.5).abs() < 1e-6)));
    assert!((last.unwrap().closure_duration_ms - 937.5).abs() < 1e-6);
}

#[test]
fn sustained_closure_reads_sleeping() {
    let mut s = session();
    let mut t = 0.0;

    for _ in 0..16 {
        s.process_frame(&input(0.30, 0.5), t);
        t += DT;
    }

    // 1.8 s of closed eyes
    let mut states = Vec::new();
    for _ in 0..29 {
        let r = s.process_frame(&input(0.10, 0.5), t);
        t += DT;
        states.push(r.sample.attention_state);
    }

    assert!(states.contains(&AttentionState::Drowsy));
    assert!(states.contains(&AttentionState::Sleeping));
    // Severity only escalates while the eyes stay closed
    let first_sleeping = states
        .iter()
        .position(|&st| st == AttentionState::Sleeping)
        .unwrap();
    assert!(states[first_sleeping..]
        .iter()
        .all(|&st| st == AttentionState::Sleeping));
}

#[test]
fn low_light_gates_the_frame_and_zeroes_geometry() {
    let mut s = session();
    let mut t = 0.0;

    for _ in 0..8 {
        s.process_frame(&input(0.30, 0.5), t);
        t += DT;
    }

    let dim = FrameInput {
        landmarks: Some(face(0.30, 0.5)),
        width: W,
        height: H,
        brightness: 40.0,
    };
    let r = s.process_frame(&dim, t);

    assert_eq!(r.sample.attention_state, AttentionState::LowLight);
    assert_eq!(r.sample.ear, 0.0);
    assert_eq!(r.sample.gaze, 0.0);
    assert_eq!(r.sample.yaw, 0.0);
    assert!(r.events.is_empty());
}

#[test]
fn detection_loss_holds_state_then_degrades() {
    let mut s = session();
    let mut t = 0.0;

    for _ in 0..16 {
        s.process_frame(&input(0.30, 0.5), t);
        t += DT;
    }

    // Four dropout frames hold the last emitted state
    for _ in 0..4 {
        let r = s.process_frame(&no_face(), t);
        t += DT;
        assert_eq!(r.sample.attention_state, AttentionState::Attentive);
        assert_eq!(r.sample.ear, 0.0);
    }

    // The fifth one exceeds the tolerance
    let r = s.process_frame(&no_face(), t);
    t += DT;
    assert_eq!(r.sample.attention_state, AttentionState::NotPresent);

    // A successful detection resets the failure counter
    let r = s.process_frame(&input(0.30, 0.5), t);
    t += DT;
    assert_eq!(r.sample.attention_state, AttentionState::Attentive);

    let r = s.process_frame(&no_face(), t);
    assert_eq!(r.sample.attention_state, AttentionState::Attentive);
}

#[test]
fn distraction_forces_state_and_records_duration() {
    let mut s = session();
    let mut t = 0.0;

    for _ in 0..16 {
        s.process_frame(&input(0.30, 0.5), t);
        t += DT;
    }

    // Gaze hard to one side for exactly 3.0 s
    let mut distracted_at = Vec::new();
    for _ in 0..48 {
        let r = s.process_frame(&input(0.30, 1.0), t);
        if r.sample.attention_state == AttentionState::Distracted {
            distracted_at.push(r.sample.timestamp);
        }
        t += DT;
    }
    assert!(
        !distracted_at.is_empty(),
        "state never forced to Distracted"
    );

    // Re-center and collect the completed episode
    let mut ended = Vec::new();
    let mut last = None;
    for _ in 0..8 {
        let r = s.process_frame(&input(0.30, 0.5), t);
        t += DT;
        ended.extend(r.events.clone());
        last = Some(r.sample);
    }

    let durations: Vec<f64> = ended
        .iter()
        .filter_map(|e| match e {
            AttentionEvent::DistractionEnded { duration_s } => Some(*duration_s),
            _ => None,
        })
        .collect();
    assert_eq!(durations.len(), 1);
    assert!((durations[0] - 3.0).abs() < 1e-6, "episode was {}", durations[0]);
    assert!((last.unwrap().distraction_duration_s - 3.0).abs() < 1e-6);

    // Forced exactly 2.0 s into the episode. The smoothing window crosses
    // the band edge two frames into the raw gaze step (1.0 s + 2/16 s), so
    // the first Distracted frame lands at 3.125 s.
    let first = distracted_at.first().unwrap();
    assert!((first - 3.125).abs() < 1e-9, "first Distracted at {}", first);
}

#[test]
fn degenerate_eye_geometry_is_a_detection_loss_not_a_crash() {
    let mut s = session();
    let mut t = 0.0;

    for _ in 0..8 {
        s.process_frame(&input(0.30, 0.5), t);
        t += DT;
    }

    let degenerate = FrameInput {
        landmarks: Some(face_with_collapsed_eye()),
        width: W,
        height: H,
        brightness: 128.0,
    };

    let before = s.blink_total();
    let r = s.process_frame(&degenerate, t);

    // Held state, zeroed geometry, nothing counted
    assert_eq!(r.sample.attention_state, AttentionState::Attentive);
    assert_eq!(r.sample.ear, 0.0);
    assert_eq!(s.blink_total(), before);
}

fn face_with_collapsed_eye() -> LandmarkSet {
    let mut points = vec![[0.5f32, 0.5f32]; MESH_POINTS];
    points[1] = [0.5, 0.5];
    points[61] = [0.40625, 0.625];
    points[291] = [0.59375, 0.625];
    points[199] = [0.5, 368.0 / 480.0];
    set_eye(&mut points, &LEFT_EYE, 0.40625, 0.375, 0.30);
    set_eye(&mut points, &RIGHT_EYE, 0.53375, 0.375, 0.30);
    // Coincident corners on the left eye
    points[LEFT_EYE[3]] = points[LEFT_EYE[0]];
    points[LEFT_IRIS_CENTER] = [0.43625, 0.375];
    points[RIGHT_IRIS_CENTER] = [0.56375, 0.375];
    LandmarkSet::from_points(points).unwrap()
}
