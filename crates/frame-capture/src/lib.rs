//! Frame Capture Library for Viewer Attention Tracking
//!
//! Provides the decoded frame type handed to landmark detection, plus the
//! lighting-normalization preprocessing stage:
//! - RGB frame with grayscale/luminance helpers
//! - Global histogram equalization and CLAHE
//! - A `FrameSource` abstraction over the webcam (the device itself is an
//!   external collaborator; a synthetic source is included for model-free
//!   bring-up and tests)

pub mod frame;
pub mod lighting;
pub mod synthetic;

pub use frame::VideoFrame;
pub use lighting::{LightingNormalizer, PreparedFrame};
pub use synthetic::SyntheticCamera;

use thiserror::Error;

/// Capture error types
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to open capture device: {0}")]
    Open(String),

    #[error("Invalid format: {0}")]
    Format(String),

    #[error("Streaming error: {0}")]
    Stream(String),

    #[error("Capture timeout")]
    Timeout,

    #[error("End of stream")]
    EndOfStream,
}

/// Capture configuration
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Device path (e.g., "/dev/video0")
    pub device: String,
    /// Capture width
    pub width: u32,
    /// Capture height
    pub height: u32,
    /// Target FPS
    pub fps: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self::webcam()
    }
}

impl CaptureConfig {
    /// Viewer-facing webcam config (the pipeline is paced at ~16 fps)
    pub fn webcam() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            width: 640,
            height: 480,
            fps: 16,
        }
    }
}

/// Source of decoded frames.
///
/// One frame is pulled, fully processed, then the next is pulled. An `Err`
/// from `next_frame` is fatal to the capture session: the caller stops
/// pulling. Detection-level failures (no face in the frame) are NOT errors
/// here; they are represented downstream as an absent landmark set.
pub trait FrameSource {
    /// Pull the next frame.
    fn next_frame(&mut self) -> Result<VideoFrame, CaptureError>;
}
