//! Rolling-window signal smoothing

use std::collections::VecDeque;

/// Fixed-capacity rolling mean over a raw per-frame signal.
///
/// The first sample passes through unchanged; after that the smoothed value
/// is the arithmetic mean of the window contents.
#[derive(Debug, Clone)]
pub struct SignalSmoother {
    buffer: VecDeque<f64>,
    capacity: usize,
}

impl SignalSmoother {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "smoothing window must hold at least one sample");
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample and return the smoothed value.
    pub fn push(&mut self, value: f64) -> f64 {
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(value);
        self.mean()
    }

    /// Mean of the current window contents (0.0 when empty).
    pub fn mean(&self) -> f64 {
        if self.buffer.is_empty() {
            return 0.0;
        }
        self.buffer.iter().sum::<f64>() / self.buffer.len() as f64
    }

    /// Median of the current window contents (0.0 when empty). Used for
    /// calibration-time EAR, where outliers matter more than lag.
    pub fn median(&self) -> f64 {
        median_of(self.buffer.iter().copied().collect())
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

fn median_of(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Estimates a per-viewer EAR threshold from calibration samples.
///
/// Collect EAR samples with the eyes deliberately closed, then deliberately
/// open; the threshold lands between the two medians, biased toward the
/// closed side so a half-lidded gaze does not register as a blink.
#[derive(Debug, Clone, Default)]
pub struct EarCalibrator {
    closed: Vec<f64>,
    open: Vec<f64>,
}

impl EarCalibrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_closed_sample(&mut self, ear: f64) {
        if ear.is_finite() {
            self.closed.push(ear);
        }
    }

    pub fn add_open_sample(&mut self, ear: f64) {
        if ear.is_finite() {
            self.open.push(ear);
        }
    }

    pub fn closed_samples(&self) -> usize {
        self.closed.len()
    }

    pub fn open_samples(&self) -> usize {
        self.open.len()
    }

    /// Calibrated threshold, or `None` until both phases have samples.
    pub fn threshold(&self) -> Option<f64> {
        if self.closed.is_empty() || self.open.is_empty() {
            return None;
        }
        let closed = median_of(self.closed.clone());
        let open = median_of(self.open.clone());
        Some((closed + open) / 2.2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_first_sample_passes_through() {
        let mut smoother = SignalSmoother::new(5);
        assert_eq!(smoother.push(0.3), 0.3);
    }

    #[test]
    fn test_window_eviction() {
        let mut smoother = SignalSmoother::new(3);
        smoother.push(1.0);
        smoother.push(2.0);
        smoother.push(3.0);
        // 1.0 evicted: mean of [2, 3, 4]
        assert!((smoother.push(4.0) - 3.0).abs() < 1e-9);
        assert_eq!(smoother.len(), 3);
    }

    #[test]
    fn test_median_even_window() {
        let mut smoother = SignalSmoother::new(4);
        for v in [0.1, 0.4, 0.2, 0.3] {
            smoother.push(v);
        }
        assert!((smoother.median() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_calibrator_threshold() {
        let mut cal = EarCalibrator::new();
        assert_eq!(cal.threshold(), None);

        for _ in 0..20 {
            cal.add_closed_sample(0.18);
            cal.add_open_sample(0.30);
        }
        let threshold = cal.threshold().unwrap();
        assert!((threshold - (0.18 + 0.30) / 2.2).abs() < 1e-9);
        // Lands strictly between the two clusters
        assert!(threshold > 0.18 && threshold < 0.30);
    }

    proptest! {
        #[test]
        fn prop_constant_signal_converges_within_window(value in -10.0f64..10.0, noise in -10.0f64..10.0) {
            let mut smoother = SignalSmoother::new(5);
            smoother.push(noise);
            // One full window of a constant drives the mean to exactly it
            let mut last = 0.0;
            for _ in 0..5 {
                last = smoother.push(value);
            }
            prop_assert!((last - value).abs() < 1e-9);
        }
    }
}
