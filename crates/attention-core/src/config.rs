//! Attention detection configuration

use crate::AttentionError;
use serde::{Deserialize, Serialize};

/// Detection thresholds and timings. All durations are seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttentionConfig {
    /// EAR below this means the eyes are closed
    pub ear_threshold: f64,

    /// Shortest closure that counts as a blink
    pub min_blink_s: f64,

    /// Longest closure that counts as a blink
    pub max_blink_s: f64,

    /// Minimum open time between two counted blinks (debounce)
    pub min_blink_gap_s: f64,

    /// Closure longer than this is a long closure (live state: Drowsy)
    pub long_closure_s: f64,

    /// Closure longer than this forces Sleeping
    pub drowsy_s: f64,

    /// Gaze ratio band considered centered (exclusive bounds)
    pub gaze_center_min: f64,
    pub gaze_center_max: f64,

    /// Off-center time before the state is forced to Distracted
    pub distraction_limit_s: f64,

    /// Head yaw beyond this is not-focused (degrees)
    pub yaw_limit_deg: f64,

    /// Head pitch beyond this is not-focused (degrees)
    pub pitch_limit_deg: f64,

    /// Mean frame luminance below this gates the frame as LowLight
    pub low_light_threshold: f64,

    /// Consecutive detection failures tolerated before NotPresent
    pub detection_tolerance: u32,

    /// Rolling-mean window for EAR and gaze smoothing (samples)
    pub smoothing_window: usize,
}

impl Default for AttentionConfig {
    fn default() -> Self {
        Self {
            ear_threshold: 0.21,
            min_blink_s: 0.10,
            max_blink_s: 0.40,
            min_blink_gap_s: 0.20,
            long_closure_s: 0.8,
            drowsy_s: 1.5,
            gaze_center_min: 0.25,
            gaze_center_max: 0.75,
            distraction_limit_s: 2.0,
            yaw_limit_deg: 25.0,
            pitch_limit_deg: 20.0,
            low_light_threshold: 55.0,
            detection_tolerance: 5,
            smoothing_window: 5,
        }
    }
}

impl AttentionConfig {
    /// Stricter thresholds (flags earlier)
    pub fn strict() -> Self {
        Self {
            drowsy_s: 1.0,
            long_closure_s: 0.6,
            distraction_limit_s: 1.5,
            yaw_limit_deg: 20.0,
            pitch_limit_deg: 15.0,
            ..Default::default()
        }
    }

    /// More lenient thresholds (flags later)
    pub fn lenient() -> Self {
        Self {
            drowsy_s: 2.5,
            long_closure_s: 1.2,
            distraction_limit_s: 4.0,
            yaw_limit_deg: 35.0,
            pitch_limit_deg: 30.0,
            ..Default::default()
        }
    }

    /// Check internal threshold ordering.
    pub fn validate(&self) -> Result<(), AttentionError> {
        if !(self.min_blink_s < self.max_blink_s && self.max_blink_s <= self.long_closure_s) {
            return Err(AttentionError::Config(format!(
                "blink window {}..{} must sit below the long-closure threshold {}",
                self.min_blink_s, self.max_blink_s, self.long_closure_s
            )));
        }
        if self.long_closure_s >= self.drowsy_s {
            return Err(AttentionError::Config(format!(
                "long-closure threshold {} must be below the drowsy threshold {}",
                self.long_closure_s, self.drowsy_s
            )));
        }
        if !(0.0 <= self.gaze_center_min && self.gaze_center_min < self.gaze_center_max && self.gaze_center_max <= 1.0)
        {
            return Err(AttentionError::Config(format!(
                "gaze band {}..{} must be an increasing sub-range of 0..1",
                self.gaze_center_min, self.gaze_center_max
            )));
        }
        if self.smoothing_window == 0 {
            return Err(AttentionError::Config(
                "smoothing window must hold at least one sample".to_string(),
            ));
        }
        if self.detection_tolerance == 0 {
            return Err(AttentionError::Config(
                "detection tolerance must be at least one frame".to_string(),
            ));
        }
        Ok(())
    }
}
