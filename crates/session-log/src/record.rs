//! Blink log record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One durable record per blink increment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlinkLogRecord {
    /// Unique record identity
    pub record_id: Uuid,
    /// Viewer alias
    pub viewer: String,
    /// Cleaned session label (what was being watched)
    pub session_label: String,
    /// Session blink total at the time of this record
    pub blink_count: u64,
    /// Seconds since session start
    pub elapsed_s: f64,
    /// Wall-clock time of the blink
    pub real_time: DateTime<Utc>,
}

impl BlinkLogRecord {
    pub fn new(
        viewer: impl Into<String>,
        session_label: impl Into<String>,
        blink_count: u64,
        elapsed_s: f64,
        real_time: DateTime<Utc>,
    ) -> Self {
        Self {
            record_id: Uuid::new_v4(),
            viewer: viewer.into(),
            session_label: session_label.into(),
            blink_count,
            elapsed_s,
            real_time,
        }
    }

    /// Idempotent logical key for receiver-side dedup. The blink count is
    /// monotonic within a session, so the triple is unique per event even
    /// when the record is delivered more than once.
    pub fn dedup_key(&self) -> String {
        format!("{}/{}/{}", self.viewer, self.session_label, self.blink_count)
    }

    /// Elapsed time as `H:MM:SS`.
    pub fn elapsed_hms(&self) -> String {
        let total = self.elapsed_s.max(0.0) as u64;
        format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
    }
}
