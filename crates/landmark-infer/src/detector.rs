//! ONNX face-mesh detector

use crate::synthetic::synthetic_neutral_face;
use crate::InferError;
use attention_core::landmarks::MESH_POINTS;
use attention_core::{FaceLandmarker, LandmarkSet};
use frame_capture::VideoFrame;
use ndarray::Array4;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use tracing::{error, info, warn};

/// Face mesh detector configuration
#[derive(Debug, Clone)]
pub struct FaceMeshConfig {
    /// Path to the face mesh ONNX model; `None` enables the synthetic
    /// fallback
    pub model_path: Option<String>,
    /// Model input edge length (square input)
    pub input_size: u32,
    /// Minimum face presence score to accept an inference
    pub presence_threshold: f32,
}

impl Default for FaceMeshConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            input_size: 192,
            presence_threshold: 0.5,
        }
    }
}

/// Face mesh landmark provider backed by an optional ONNX session.
pub struct FaceMeshDetector {
    config: FaceMeshConfig,
    session: Option<Session>,
}

impl FaceMeshDetector {
    pub fn new(config: FaceMeshConfig) -> Result<Self, InferError> {
        let session = if let Some(path) = &config.model_path {
            info!("Loading face mesh model from {}", path);
            match Session::builder() {
                Ok(builder) => {
                    match builder.with_optimization_level(GraphOptimizationLevel::Level3) {
                        Ok(builder) => match builder.commit_from_file(path) {
                            Ok(s) => Some(s),
                            Err(e) => {
                                error!("Failed to load face mesh model: {}", e);
                                return Err(InferError::ModelLoad(e.to_string()));
                            }
                        },
                        Err(e) => {
                            error!("Failed to configure model optimization: {}", e);
                            return Err(InferError::ModelLoad(e.to_string()));
                        }
                    }
                }
                Err(e) => {
                    error!("Failed to create session builder: {}", e);
                    return Err(InferError::ModelLoad(e.to_string()));
                }
            }
        } else {
            warn!("No face mesh model path configured. Using synthetic landmarks.");
            None
        };

        Ok(Self { config, session })
    }

    fn infer(&mut self, frame: &VideoFrame) -> Result<Option<LandmarkSet>, InferError> {
        let Some(session) = &mut self.session else {
            // Synthetic fallback: a neutral frontal face every frame
            return Ok(Some(synthetic_neutral_face()));
        };

        let size = self.config.input_size;

        // 1. Preprocess: resize to the square model input
        let img = image::RgbImage::from_raw(frame.width, frame.height, frame.data.clone())
            .ok_or_else(|| {
                InferError::ImageProcessing("failed to create image buffer".to_string())
            })?;
        let resized =
            image::imageops::resize(&img, size, size, image::imageops::FilterType::Triangle);

        // 2. Normalize to 0..1, NCHW tensor
        let mut input_array = Array4::<f32>::zeros((1, 3, size as usize, size as usize));
        for (x, y, pixel) in resized.enumerate_pixels() {
            input_array[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
            input_array[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
            input_array[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
        }

        // 3. Inference
        let outputs = session
            .run(ort::inputs![input_array].map_err(|e| InferError::Inference(e.to_string()))?)
            .map_err(|e| InferError::Inference(e.to_string()))?;

        // 4. Presence gate (second output, when the model provides one)
        if outputs.len() > 1 {
            let score = outputs[1]
                .try_extract_tensor::<f32>()
                .map_err(|e| InferError::Decode(e.to_string()))?;
            let score = score.iter().next().copied().unwrap_or(0.0);
            if score < self.config.presence_threshold {
                return Ok(None);
            }
        }

        // 5. Decode 478 x/y/z triples, normalized by the input edge
        let coords = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| InferError::Decode(e.to_string()))?;
        let flat: Vec<f32> = coords.iter().copied().collect();
        if flat.len() < MESH_POINTS * 3 {
            return Err(InferError::Decode(format!(
                "expected {} coordinates, got {}",
                MESH_POINTS * 3,
                flat.len()
            )));
        }

        let points: Vec<[f32; 2]> = flat
            .chunks_exact(3)
            .take(MESH_POINTS)
            .map(|xyz| [xyz[0] / size as f32, xyz[1] / size as f32])
            .collect();

        let set = LandmarkSet::from_points(points)
            .map_err(|e| InferError::Decode(e.to_string()))?;
        Ok(Some(set))
    }
}

impl FaceLandmarker for FaceMeshDetector {
    fn detect(&mut self, frame: &VideoFrame) -> Option<LandmarkSet> {
        match self.infer(frame) {
            Ok(result) => result,
            Err(e) => {
                // Inference trouble is a per-frame detection failure, never
                // fatal: the session's hold/NotPresent logic absorbs it
                warn!("landmark inference failed: {}", e);
                None
            }
        }
    }
}
