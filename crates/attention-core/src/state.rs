//! Attention states and the closure / gaze sub-state machines
//!
//! The per-frame label is assembled from two independent sub-machines plus
//! the head-pose flag. Each sub-machine is a tagged union stepped by a
//! deterministic function of (state, input, now); completed episodes come
//! back as events for the aggregator, keeping detection and aggregation
//! separately testable.

use crate::config::AttentionConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete viewer attention label, exactly one per processed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AttentionState {
    #[default]
    Attentive,
    Distracted,
    Drowsy,
    Sleeping,
    NotFocused,
    NotPresent,
    LowLight,
}

impl fmt::Display for AttentionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AttentionState::Attentive => "Attentive",
            AttentionState::Distracted => "Distracted",
            AttentionState::Drowsy => "Drowsy",
            AttentionState::Sleeping => "Sleeping",
            AttentionState::NotFocused => "Not Focused",
            AttentionState::NotPresent => "Not Present",
            AttentionState::LowLight => "Low Light",
        };
        f.write_str(label)
    }
}

/// Eye-closure sub-machine state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClosureState {
    Open,
    Closed { since: f64 },
}

/// Live severity reported while the closure machine runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosureLevel {
    Open,
    /// Closed, but not yet past the long-closure threshold
    Closed,
    /// Closed past the long-closure threshold
    Drowsy,
    /// Closed past the drowsy threshold
    Sleeping,
}

/// Outcome of a just-ended closure episode
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClosureEvent {
    /// Counted blink
    Blink { duration_s: f64 },
    /// Reopened after a long closure; recorded but not a blink
    LongClosure { duration_s: f64 },
}

/// Eye-closure / drowsiness monitor.
#[derive(Debug, Clone)]
pub struct ClosureMonitor {
    state: ClosureState,
    /// Time of the previous reopening, for the blink debounce
    last_reopen_at: Option<f64>,
}

impl Default for ClosureMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ClosureMonitor {
    pub fn new() -> Self {
        Self {
            state: ClosureState::Open,
            last_reopen_at: None,
        }
    }

    /// Step with the smoothed EAR for this frame.
    pub fn step(
        &mut self,
        smoothed_ear: f64,
        now: f64,
        config: &AttentionConfig,
    ) -> (ClosureLevel, Option<ClosureEvent>) {
        match self.state {
            ClosureState::Open => {
                if smoothed_ear < config.ear_threshold {
                    self.state = ClosureState::Closed { since: now };
                    (ClosureLevel::Closed, None)
                } else {
                    (ClosureLevel::Open, None)
                }
            }
            ClosureState::Closed { since } => {
                let duration = now - since;
                if smoothed_ear < config.ear_threshold {
                    let level = if duration > config.drowsy_s {
                        ClosureLevel::Sleeping
                    } else if duration > config.long_closure_s {
                        ClosureLevel::Drowsy
                    } else {
                        ClosureLevel::Closed
                    };
                    (level, None)
                } else {
                    let event = self.classify_closure(duration, now, config);
                    self.state = ClosureState::Open;
                    self.last_reopen_at = Some(now);
                    (ClosureLevel::Open, event)
                }
            }
        }
    }

    /// Classify a closure that just ended at `now`.
    fn classify_closure(
        &self,
        duration: f64,
        now: f64,
        config: &AttentionConfig,
    ) -> Option<ClosureEvent> {
        let gap_ok = self
            .last_reopen_at
            .is_none_or(|t| now - t > config.min_blink_gap_s);

        if (config.min_blink_s..=config.max_blink_s).contains(&duration) && gap_ok {
            Some(ClosureEvent::Blink { duration_s: duration })
        } else if duration > config.long_closure_s {
            Some(ClosureEvent::LongClosure { duration_s: duration })
        } else {
            // Too short to be physiological, or too soon after the last
            // blink: noise, not recorded
            None
        }
    }
}

/// Gaze sub-machine state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GazeState {
    Centered,
    Distracted { since: f64 },
}

/// Gaze / distraction monitor.
#[derive(Debug, Clone)]
pub struct GazeMonitor {
    state: GazeState,
}

impl Default for GazeMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl GazeMonitor {
    pub fn new() -> Self {
        Self {
            state: GazeState::Centered,
        }
    }

    /// Step with the smoothed gaze ratio for this frame. Returns whether the
    /// distraction limit has been reached, plus the duration of an episode
    /// that just ended.
    pub fn step(
        &mut self,
        smoothed_gaze: f64,
        now: f64,
        config: &AttentionConfig,
    ) -> (bool, Option<f64>) {
        let centered =
            config.gaze_center_min < smoothed_gaze && smoothed_gaze < config.gaze_center_max;

        match self.state {
            GazeState::Centered => {
                if !centered {
                    self.state = GazeState::Distracted { since: now };
                }
                (false, None)
            }
            GazeState::Distracted { since } => {
                if centered {
                    self.state = GazeState::Centered;
                    (false, Some(now - since))
                } else {
                    (now - since >= config.distraction_limit_s, None)
                }
            }
        }
    }
}

/// Merge the per-frame signals into one attention label.
///
/// Priority, lowest to highest: Attentive, Distracted, Drowsy/Sleeping,
/// NotFocused. The ordering is inherited from the reference behavior this
/// pipeline replaces and is pinned by tests; note that NotFocused masks even
/// Sleeping — consumers relying on the label stream were built against that.
pub fn resolve_state(
    gaze_distracted: bool,
    closure: ClosureLevel,
    head_not_focused: bool,
) -> AttentionState {
    let mut state = AttentionState::Attentive;
    if gaze_distracted {
        state = AttentionState::Distracted;
    }
    match closure {
        ClosureLevel::Drowsy => state = AttentionState::Drowsy,
        ClosureLevel::Sleeping => state = AttentionState::Sleeping,
        ClosureLevel::Open | ClosureLevel::Closed => {}
    }
    if head_not_focused {
        state = AttentionState::NotFocused;
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config() -> AttentionConfig {
        AttentionConfig::default()
    }

    #[test]
    fn test_blink_counted_in_window() {
        let mut monitor = ClosureMonitor::new();
        let cfg = config();

        monitor.step(0.30, 0.0, &cfg);
        monitor.step(0.10, 1.0, &cfg); // close
        let (level, event) = monitor.step(0.30, 1.25, &cfg); // reopen after 0.25 s

        assert_eq!(level, ClosureLevel::Open);
        assert_eq!(event, Some(ClosureEvent::Blink { duration_s: 0.25 }));
    }

    #[test]
    fn test_too_short_closure_discarded() {
        let mut monitor = ClosureMonitor::new();
        let cfg = config();

        monitor.step(0.10, 1.0, &cfg);
        let (_, event) = monitor.step(0.30, 1.05, &cfg); // 50 ms: noise
        assert_eq!(event, None);
    }

    #[test]
    fn test_debounce_blocks_double_count() {
        let mut monitor = ClosureMonitor::new();
        let cfg = config();

        monitor.step(0.10, 1.0, &cfg);
        let (_, first) = monitor.step(0.30, 1.2, &cfg);
        assert!(matches!(first, Some(ClosureEvent::Blink { .. })));

        // Second qualifying-length closure reopening only 0.15 s later
        monitor.step(0.10, 1.23, &cfg);
        let (_, second) = monitor.step(0.30, 1.35, &cfg);
        assert_eq!(second, None);

        // After a respectful gap the next blink counts again
        monitor.step(0.10, 2.0, &cfg);
        let (_, third) = monitor.step(0.30, 2.2, &cfg);
        assert!(matches!(third, Some(ClosureEvent::Blink { .. })));
    }

    #[test]
    fn test_long_closure_levels_and_event() {
        let mut monitor = ClosureMonitor::new();
        let cfg = config();

        monitor.step(0.10, 0.0, &cfg);
        let (level, _) = monitor.step(0.10, 0.5, &cfg);
        assert_eq!(level, ClosureLevel::Closed);

        let (level, _) = monitor.step(0.10, 0.85, &cfg);
        assert_eq!(level, ClosureLevel::Drowsy);

        let (level, event) = monitor.step(0.30, 0.9, &cfg);
        assert_eq!(level, ClosureLevel::Open);
        assert_eq!(event, Some(ClosureEvent::LongClosure { duration_s: 0.9 }));
    }

    #[test]
    fn test_sleeping_past_drowsy_threshold() {
        let mut monitor = ClosureMonitor::new();
        let cfg = config();

        monitor.step(0.10, 0.0, &cfg);
        let (level, _) = monitor.step(0.10, 1.2, &cfg);
        assert_eq!(level, ClosureLevel::Drowsy);
        let (level, _) = monitor.step(0.10, 1.6, &cfg);
        assert_eq!(level, ClosureLevel::Sleeping);
    }

    #[test]
    fn test_gaze_episode_lifecycle() {
        let mut monitor = GazeMonitor::new();
        let cfg = config();

        assert_eq!(monitor.step(0.5, 0.0, &cfg), (false, None));

        // Leaves the band; not yet over the limit
        assert_eq!(monitor.step(0.9, 1.0, &cfg), (false, None));
        assert_eq!(monitor.step(0.9, 2.5, &cfg), (false, None));

        // Over the limit exactly at 2.0 s into the episode
        assert_eq!(monitor.step(0.9, 3.0, &cfg), (true, None));
        assert_eq!(monitor.step(0.9, 3.5, &cfg), (true, None));

        // Re-centering closes the episode with its full duration
        let (flag, ended) = monitor.step(0.5, 4.0, &cfg);
        assert!(!flag);
        assert_eq!(ended, Some(3.0));
    }

    #[test]
    fn test_gaze_band_bounds_are_exclusive() {
        let mut monitor = GazeMonitor::new();
        let cfg = config();

        monitor.step(0.75, 0.0, &cfg); // exactly on the edge: off-center
        assert!(matches!(monitor.state, GazeState::Distracted { .. }));
    }

    #[test]
    fn test_resolve_state_priority() {
        use AttentionState::*;

        assert_eq!(resolve_state(false, ClosureLevel::Open, false), Attentive);
        assert_eq!(resolve_state(false, ClosureLevel::Closed, false), Attentive);
        assert_eq!(resolve_state(true, ClosureLevel::Open, false), Distracted);
        assert_eq!(resolve_state(true, ClosureLevel::Drowsy, false), Drowsy);
        assert_eq!(resolve_state(true, ClosureLevel::Sleeping, false), Sleeping);
        // Head pose masks everything, including Sleeping
        assert_eq!(resolve_state(true, ClosureLevel::Sleeping, true), NotFocused);
        assert_eq!(resolve_state(false, ClosureLevel::Open, true), NotFocused);
    }

    proptest! {
        /// A lone closure is a blink exactly when its duration is inside the
        /// blink window (no debounce pressure on a fresh monitor).
        #[test]
        fn prop_blink_iff_duration_in_window(duration in 0.01f64..3.0) {
            let mut monitor = ClosureMonitor::new();
            let cfg = config();

            monitor.step(0.10, 10.0, &cfg);
            let (_, event) = monitor.step(0.30, 10.0 + duration, &cfg);

            let expect_blink = (cfg.min_blink_s..=cfg.max_blink_s).contains(&duration);
            prop_assert_eq!(
                matches!(event, Some(ClosureEvent::Blink { .. })),
                expect_blink
            );
        }

        /// Two well-formed blinks: the second counts iff its reopening comes
        /// more than the debounce gap after the previous reopening.
        #[test]
        fn prop_second_blink_requires_gap(open_gap in 0.0f64..1.0) {
            let mut monitor = ClosureMonitor::new();
            let cfg = config();

            monitor.step(0.10, 0.0, &cfg);
            let (_, first) = monitor.step(0.30, 0.2, &cfg);
            prop_assert!(matches!(first, Some(ClosureEvent::Blink { .. })), "first closure should be a blink");

            // Second closure of 0.15 s after an open gap
            monitor.step(0.10, 0.2 + open_gap, &cfg);
            let (_, second) = monitor.step(0.30, 0.35 + open_gap, &cfg);

            // Reopen-to-reopen distance is open_gap + 0.15
            prop_assert_eq!(
                matches!(second, Some(ClosureEvent::Blink { .. })),
                open_gap + 0.15 > cfg.min_blink_gap_s
            );
        }
    }
}
