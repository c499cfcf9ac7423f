//! Attention Metrics
//!
//! Rolling aggregation over blink and distraction events:
//! - Blink rate over a trailing 60-second window
//! - Monotonic blink total
//! - Bounded closure/distraction duration histories (last and longest)
//! - Summary statistics for end-of-session reporting

mod aggregator;
mod statistics;
mod window;

pub use aggregator::RollingAggregator;
pub use statistics::StatisticalSummary;
pub use window::SlidingWindow;
