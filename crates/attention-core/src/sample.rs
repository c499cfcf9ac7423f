//! Per-frame output types

use crate::state::AttentionState;
use serde::{Deserialize, Serialize};

/// One emitted measurement per processed frame. Immutable once produced;
/// the presentation layer keeps a bounded history of these.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttentionSample {
    /// Seconds since session start
    pub timestamp: f64,
    /// Smoothed eye aspect ratio (0 on degraded frames)
    pub ear: f64,
    /// Smoothed gaze ratio, 0..1 (0 on degraded frames)
    pub gaze: f64,
    /// Head yaw in degrees (0 on degraded frames)
    pub yaw: f64,
    /// Attention label for this frame
    pub attention_state: AttentionState,
    /// Blinks in the trailing 60 s (blinks/minute)
    pub blink_rate: u32,
    /// Most recently completed closure, milliseconds (0 if none yet)
    pub closure_duration_ms: f64,
    /// Most recently completed distraction, seconds (0 if none yet)
    pub distraction_duration_s: f64,
}

/// Detection events surfaced alongside a frame's sample, for consumers that
/// act per-event (the blink log sink) rather than per-frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttentionEvent {
    /// A blink was counted this frame
    BlinkDetected {
        /// Session blink total including this one
        blink_total: u64,
        duration_ms: f64,
    },
    /// A long closure reopened (recorded, not counted as a blink)
    ClosureEnded { duration_ms: f64 },
    /// A distraction episode ended
    DistractionEnded { duration_s: f64 },
}
