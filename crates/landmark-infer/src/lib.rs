//! Face Mesh Landmark Inference
//!
//! Implements the core's `FaceLandmarker` capability with an ONNX face-mesh
//! model. When no model path is configured the detector falls back to a
//! deterministic synthetic neutral face, so the rest of the pipeline can be
//! exercised without a model file or camera present.

mod detector;
mod synthetic;

pub use detector::{FaceMeshConfig, FaceMeshDetector};
pub use synthetic::synthetic_neutral_face;

use thiserror::Error;

/// Inference error types
#[derive(Error, Debug)]
pub enum InferError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Output decoding failed: {0}")]
    Decode(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),
}
