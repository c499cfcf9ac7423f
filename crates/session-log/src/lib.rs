//! Session Log Sink
//!
//! Receives one record per blink increment from the detection pipeline and
//! makes it durable and visible:
//! - Append-only CSV log with a bounded in-memory mirror
//! - MQTT upload (at-least-once) with a bounded offline queue; every record
//!   carries an idempotent logical key so the receiving side can dedup
//! - Viewer alias generation and session-label cleaning

mod alias;
mod record;
mod store;
mod title;
mod upload;

pub use alias::get_or_create_alias;
pub use record::BlinkLogRecord;
pub use store::LogStore;
pub use title::clean_session_label;
pub use upload::{BlinkMessage, CloudUploader, UploadConfig};

use thiserror::Error;

/// Log sink error types
#[derive(Error, Debug)]
pub enum LogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Publish failed: {0}")]
    Publish(String),
}
