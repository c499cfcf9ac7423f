//! Per-session detection pipeline
//!
//! `DetectionSession` owns every mutable piece of the per-frame state
//! machine — smoothing buffers, sub-machine states, failure counter,
//! rolling metrics — so nothing leaks across capture sessions and tests can
//! drive it with synthetic landmarks and synthetic time.

use crate::config::AttentionConfig;
use crate::geometry::{eye_aspect_ratio, gaze_ratio};
use crate::landmarks::{
    LandmarkSet, LEFT_EYE, LEFT_IRIS_CENTER, RIGHT_EYE, RIGHT_IRIS_CENTER,
};
use crate::pose::PoseEstimator;
use crate::sample::{AttentionEvent, AttentionSample};
use crate::smoothing::SignalSmoother;
use crate::state::{resolve_state, AttentionState, ClosureEvent, ClosureMonitor, GazeMonitor};
use crate::AttentionError;
use attention_metrics::RollingAggregator;
use tracing::{debug, info};

/// Everything the core needs for one frame, supplied by the acquisition and
/// inference collaborators.
#[derive(Debug, Clone)]
pub struct FrameInput {
    /// Landmarks for the (single) detected face, or `None`
    pub landmarks: Option<LandmarkSet>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Mean luminance of the raw frame, 0-255
    pub brightness: f64,
}

/// Output of one processed frame.
#[derive(Debug, Clone)]
pub struct FrameResult {
    pub sample: AttentionSample,
    pub events: Vec<AttentionEvent>,
}

/// Geometric signals extracted from one landmark set.
struct RawSignals {
    avg_ear: f64,
    gaze: f64,
    pose_points: [[f64; 2]; 6],
}

/// Single-session attention pipeline. Not reentrant: frames must be applied
/// strictly in arrival order — the episode durations are differences against
/// times recorded on earlier frames.
pub struct DetectionSession {
    config: AttentionConfig,
    ear_smoother: SignalSmoother,
    gaze_smoother: SignalSmoother,
    pose: PoseEstimator,
    closure: ClosureMonitor,
    gaze: GazeMonitor,
    metrics: RollingAggregator,
    /// Consecutive frames without a usable face
    fail_count: u32,
    /// State emitted for the previous frame (held during short dropouts)
    last_state: AttentionState,
}

impl DetectionSession {
    pub fn new(config: AttentionConfig) -> Result<Self, AttentionError> {
        config.validate()?;
        info!(
            ear_threshold = config.ear_threshold,
            low_light = config.low_light_threshold,
            "detection session started"
        );
        Ok(Self {
            ear_smoother: SignalSmoother::new(config.smoothing_window),
            gaze_smoother: SignalSmoother::new(config.smoothing_window),
            pose: PoseEstimator::new(),
            closure: ClosureMonitor::new(),
            gaze: GazeMonitor::new(),
            metrics: RollingAggregator::default(),
            fail_count: 0,
            last_state: AttentionState::Attentive,
            config,
        })
    }

    /// Process one frame. `now` is seconds since session start and must be
    /// non-decreasing across calls.
    pub fn process_frame(&mut self, input: &FrameInput, now: f64) -> FrameResult {
        // Ambient-light gate: short-circuits everything, including the
        // face-presence bookkeeping
        if input.brightness < self.config.low_light_threshold {
            debug!(brightness = input.brightness, "low light, detection unreliable");
            return self.emit_degraded(AttentionState::LowLight, now);
        }

        let signals = input
            .landmarks
            .as_ref()
            .and_then(|lm| Self::extract_signals(lm, input.width, input.height));

        let Some(raw) = signals else {
            return self.detection_failed(now);
        };
        self.fail_count = 0;

        let smooth_ear = self.ear_smoother.push(raw.avg_ear);
        let smooth_gaze = self.gaze_smoother.push(raw.gaze);

        let head_pose = self.pose.estimate(&raw.pose_points, input.width, input.height);
        let head_not_focused =
            head_pose.not_focused(self.config.yaw_limit_deg, self.config.pitch_limit_deg);

        let (closure_level, closure_event) = self.closure.step(smooth_ear, now, &self.config);
        let (gaze_distracted, gaze_ended) = self.gaze.step(smooth_gaze, now, &self.config);

        let mut events = Vec::new();
        match closure_event {
            Some(ClosureEvent::Blink { duration_s }) => {
                let duration_ms = duration_s * 1000.0;
                self.metrics.record_blink(now, duration_ms);
                info!(
                    total = self.metrics.blink_total(),
                    duration_ms, "blink detected"
                );
                events.push(AttentionEvent::BlinkDetected {
                    blink_total: self.metrics.blink_total(),
                    duration_ms,
                });
            }
            Some(ClosureEvent::LongClosure { duration_s }) => {
                let duration_ms = duration_s * 1000.0;
                self.metrics.record_long_closure(duration_ms);
                events.push(AttentionEvent::ClosureEnded { duration_ms });
            }
            None => {}
        }
        if let Some(duration_s) = gaze_ended {
            self.metrics.record_distraction(duration_s);
            events.push(AttentionEvent::DistractionEnded { duration_s });
        }

        let state = resolve_state(gaze_distracted, closure_level, head_not_focused);
        self.last_state = state;

        FrameResult {
            sample: AttentionSample {
                timestamp: now,
                ear: smooth_ear,
                gaze: smooth_gaze,
                yaw: head_pose.yaw,
                attention_state: state,
                blink_rate: self.metrics.blink_rate(now),
                closure_duration_ms: self.metrics.last_closure_ms(),
                distraction_duration_s: self.metrics.last_distraction_s(),
            },
            events,
        }
    }

    /// Rolling metrics for this session.
    pub fn metrics(&self) -> &RollingAggregator {
        &self.metrics
    }

    /// Total blinks this session.
    pub fn blink_total(&self) -> u64 {
        self.metrics.blink_total()
    }

    pub fn config(&self) -> &AttentionConfig {
        &self.config
    }

    fn extract_signals(landmarks: &LandmarkSet, width: u32, height: u32) -> Option<RawSignals> {
        let left = landmarks.eye_px(&LEFT_EYE, width, height);
        let right = landmarks.eye_px(&RIGHT_EYE, width, height);

        // Degenerate eye geometry is treated like a failed detection: the
        // frame is unusable, not wrong
        let left_ear = eye_aspect_ratio(&left)?;
        let right_ear = eye_aspect_ratio(&right)?;
        let avg_ear = (left_ear + right_ear) / 2.0;

        let left_iris = landmarks.point_px(LEFT_IRIS_CENTER, width, height);
        let right_iris = landmarks.point_px(RIGHT_IRIS_CENTER, width, height);
        let gaze_left = gaze_ratio(left[0], left[3], left_iris);
        let gaze_right = gaze_ratio(right[0], right[3], right_iris);
        let gaze = (gaze_left + gaze_right) / 2.0;

        Some(RawSignals {
            avg_ear,
            gaze,
            pose_points: landmarks.pose_px(width, height),
        })
    }

    fn detection_failed(&mut self, now: f64) -> FrameResult {
        self.fail_count += 1;
        let state = if self.fail_count < self.config.detection_tolerance {
            debug!(fail_count = self.fail_count, "detection lost, holding state");
            self.last_state
        } else {
            AttentionState::NotPresent
        };
        self.emit_degraded(state, now)
    }

    /// Emit a frame with zeroed geometry but live aggregates. The label
    /// still participates in held-state logic.
    fn emit_degraded(&mut self, state: AttentionState, now: f64) -> FrameResult {
        self.last_state = state;
        FrameResult {
            sample: AttentionSample {
                timestamp: now,
                ear: 0.0,
                gaze: 0.0,
                yaw: 0.0,
                attention_state: state,
                blink_rate: self.metrics.blink_rate(now),
                closure_duration_ms: self.metrics.last_closure_ms(),
                distraction_duration_s: self.metrics.last_distraction_s(),
            },
            events: Vec::new(),
        }
    }
}
