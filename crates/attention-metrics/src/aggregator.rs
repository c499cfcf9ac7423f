//! Rolling aggregation of blink and distraction events

use crate::window::SlidingWindow;
use std::collections::VecDeque;
use tracing::debug;

/// Trailing window for the blink rate (seconds). 60 s makes the retained
/// count read directly as blinks/minute.
pub const BLINK_RATE_WINDOW_S: f64 = 60.0;

/// Retained completed-episode durations (events, not frames)
const EPISODE_HISTORY: usize = 128;

/// Per-session rolling statistics over detection events.
///
/// Timestamps are seconds since session start, supplied by the caller; the
/// aggregator never reads the wall clock.
#[derive(Debug, Clone)]
pub struct RollingAggregator {
    window_s: f64,
    /// Blink timestamps inside the trailing window (pruned on read)
    blink_times: VecDeque<f64>,
    /// Total blinks this session (never pruned, never decreases)
    blink_total: u64,
    /// Completed closure durations, milliseconds
    closure_history: SlidingWindow<f64>,
    /// Completed distraction durations, seconds
    distraction_history: SlidingWindow<f64>,
}

impl Default for RollingAggregator {
    fn default() -> Self {
        Self::new(BLINK_RATE_WINDOW_S)
    }
}

impl RollingAggregator {
    pub fn new(window_s: f64) -> Self {
        Self {
            window_s,
            blink_times: VecDeque::new(),
            blink_total: 0,
            closure_history: SlidingWindow::new(EPISODE_HISTORY),
            distraction_history: SlidingWindow::new(EPISODE_HISTORY),
        }
    }

    /// Record a counted blink and its closure duration.
    pub fn record_blink(&mut self, now: f64, duration_ms: f64) {
        self.blink_total += 1;
        self.blink_times.push_back(now);
        self.closure_history.push(duration_ms);
        debug!(total = self.blink_total, duration_ms, "blink recorded");
    }

    /// Record a long closure that reopened without counting as a blink.
    pub fn record_long_closure(&mut self, duration_ms: f64) {
        self.closure_history.push(duration_ms);
    }

    /// Record a completed distraction episode.
    pub fn record_distraction(&mut self, duration_s: f64) {
        self.distraction_history.push(duration_s);
    }

    /// Blinks in the trailing window `(now - window, now]` — blinks/minute
    /// for the default 60 s window. Stale timestamps are evicted here.
    pub fn blink_rate(&mut self, now: f64) -> u32 {
        let cutoff = now - self.window_s;
        while self
            .blink_times
            .front()
            .is_some_and(|&t| t <= cutoff)
        {
            self.blink_times.pop_front();
        }
        self.blink_times.len() as u32
    }

    /// Total blinks this session. Monotonically non-decreasing.
    pub fn blink_total(&self) -> u64 {
        self.blink_total
    }

    /// Duration of the most recently completed closure (ms), 0 if none.
    pub fn last_closure_ms(&self) -> f64 {
        self.closure_history.back().copied().unwrap_or(0.0)
    }

    /// Duration of the most recently completed distraction (s), 0 if none.
    pub fn last_distraction_s(&self) -> f64 {
        self.distraction_history.back().copied().unwrap_or(0.0)
    }

    /// Longest recorded distraction episode (s), 0 if none.
    pub fn longest_distraction_s(&self) -> f64 {
        self.distraction_history
            .iter()
            .copied()
            .fold(0.0, f64::max)
    }

    /// Completed closure durations (ms), oldest first.
    pub fn closure_durations(&self) -> Vec<f64> {
        self.closure_history.iter().copied().collect()
    }

    /// Completed distraction durations (s), oldest first.
    pub fn distraction_durations(&self) -> Vec<f64> {
        self.distraction_history.iter().copied().collect()
    }
}
