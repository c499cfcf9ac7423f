//! Viewer Attention Core
//!
//! Real-time viewer state analysis from facial landmarks:
//! - Eye-aspect-ratio and gaze geometry
//! - Rolling-window signal smoothing
//! - Head pose estimation (generic 3-D face template)
//! - Blink / closure / drowsiness and gaze / distraction sub-state machines
//! - One attention label per processed frame
//!
//! The core is synchronous and single-threaded per session: one frame is
//! fully processed before the next arrives, and all timing is injected as
//! seconds since session start. Landmark inference itself is an external
//! capability supplied through [`FaceLandmarker`].

pub mod config;
pub mod geometry;
pub mod landmarks;
pub mod pose;
pub mod sample;
pub mod session;
pub mod smoothing;
pub mod state;

pub use config::AttentionConfig;
pub use landmarks::{FaceLandmarker, LandmarkSet};
pub use pose::{HeadPose, PoseEstimator};
pub use sample::{AttentionEvent, AttentionSample};
pub use session::{DetectionSession, FrameInput, FrameResult};
pub use state::AttentionState;

use thiserror::Error;

/// Core error types
#[derive(Error, Debug)]
pub enum AttentionError {
    #[error("Landmark set incomplete: expected {expected} points, got {got}")]
    IncompleteLandmarks { expected: usize, got: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}
