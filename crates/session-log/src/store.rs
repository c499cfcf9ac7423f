//! Durable blink log with a bounded in-memory mirror

use crate::record::BlinkLogRecord;
use crate::LogError;
use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// Bounded in-memory retention (the CSV file keeps everything)
const MAX_RECORDS: usize = 10_000;

/// Blink log store: append-only CSV on disk plus a bounded in-memory mirror
/// for recent-records queries.
pub struct LogStore {
    records: Mutex<VecDeque<BlinkLogRecord>>,
    max_records: usize,
    csv_path: Option<PathBuf>,
}

impl LogStore {
    /// In-memory store only (tests, or when persistence is disabled).
    pub fn in_memory() -> Self {
        info!("Creating in-memory log store");
        Self {
            records: Mutex::new(VecDeque::with_capacity(256)),
            max_records: MAX_RECORDS,
            csv_path: None,
        }
    }

    /// Store backed by an append-only CSV file. Parent directories are
    /// created; the header row is written if the file does not exist yet.
    pub fn with_csv(path: impl Into<PathBuf>) -> Result<Self, LogError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if !path.exists() {
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            let mut writer = csv::Writer::from_writer(file);
            writer.write_record(["real_time", "elapsed_hms", "blink_count", "session_label"])?;
            writer.flush()?;
        }

        info!(path = %path.display(), "Blink log CSV opened");
        Ok(Self {
            records: Mutex::new(VecDeque::with_capacity(256)),
            max_records: MAX_RECORDS,
            csv_path: Some(path),
        })
    }

    /// Append a record: CSV row first (durability), then the mirror.
    pub fn append(&self, record: BlinkLogRecord) -> Result<(), LogError> {
        if let Some(path) = &self.csv_path {
            self.append_csv(path, &record)?;
        }

        let mut records = self
            .records
            .lock()
            .map_err(|e| LogError::Store(format!("lock error: {}", e)))?;

        // Enforce retention
        while records.len() >= self.max_records {
            records.pop_front();
        }
        records.push_back(record);
        debug!(count = records.len(), "blink record stored");
        Ok(())
    }

    fn append_csv(&self, path: &Path, record: &BlinkLogRecord) -> Result<(), LogError> {
        let file = OpenOptions::new().append(true).open(path)?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record([
            record.real_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            record.elapsed_hms(),
            record.blink_count.to_string(),
            record.session_label.clone(),
        ])?;
        writer.flush()?;
        Ok(())
    }

    /// Most recent records, newest first.
    pub fn recent(&self, limit: usize) -> Vec<BlinkLogRecord> {
        self.records
            .lock()
            .map(|r| r.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    /// Records currently mirrored in memory.
    pub fn count(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Drop the in-memory mirror (the CSV file is untouched).
    pub fn clear(&self) {
        if let Ok(mut records) = self.records.lock() {
            records.clear();
        }
    }
}
