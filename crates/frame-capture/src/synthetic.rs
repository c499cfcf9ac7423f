//! Synthetic frame source
//!
//! Stands in for the webcam when no capture device is wired up: bring-up of
//! the detection pipeline, demos, and tests. Produces flat frames of a
//! configurable brightness with a mild horizontal gradient so the lighting
//! stage has real work to do.

use crate::frame::VideoFrame;
use crate::{CaptureConfig, CaptureError, FrameSource};
use tracing::info;

/// Deterministic frame generator implementing [`FrameSource`].
pub struct SyntheticCamera {
    config: CaptureConfig,
    brightness: u8,
    sequence: u32,
    frame_limit: Option<u32>,
}

impl SyntheticCamera {
    pub fn new(config: CaptureConfig) -> Self {
        info!(
            width = config.width,
            height = config.height,
            fps = config.fps,
            "synthetic capture source (no camera device configured)"
        );
        Self {
            config,
            brightness: 128,
            sequence: 0,
            frame_limit: None,
        }
    }

    /// Base luminance of generated frames (drive below the low-light
    /// threshold to exercise the `LowLight` gate).
    pub fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
    }

    /// Stop the stream after `limit` frames with [`CaptureError::EndOfStream`].
    pub fn with_frame_limit(mut self, limit: u32) -> Self {
        self.frame_limit = Some(limit);
        self
    }
}

impl FrameSource for SyntheticCamera {
    fn next_frame(&mut self) -> Result<VideoFrame, CaptureError> {
        if let Some(limit) = self.frame_limit {
            if self.sequence >= limit {
                return Err(CaptureError::EndOfStream);
            }
        }

        let (w, h) = (self.config.width, self.config.height);
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for _y in 0..h {
            for x in 0..w {
                // Mild left-to-right gradient around the base brightness
                let delta = (x * 16 / w.max(1)) as i16 - 8;
                let v = (self.brightness as i16 + delta).clamp(0, 255) as u8;
                data.extend_from_slice(&[v, v, v]);
            }
        }

        let fps = self.config.fps.max(1) as u64;
        let frame = VideoFrame::new(
            data,
            w,
            h,
            self.sequence as u64 * 1_000_000_000 / fps,
            self.sequence,
        );
        self.sequence += 1;
        Ok(frame)
    }
}
