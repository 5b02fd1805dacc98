//! YuNet face model on ONNX Runtime.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgb};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::info;

use reframe_models::{Frame, Landmark, RawDetection, LANDMARK_COUNT};

use crate::error::{ServiceError, ServiceResult};

/// Square model input resolution.
pub const INPUT_SIZE: u32 = 320;

/// Values per output row: box (4), score (1), landmarks (10).
const ROW_LEN: usize = 5 + 2 * LANDMARK_COUNT;

/// Something that finds faces in a full-resolution frame.
pub trait FaceModel: Send {
    /// Detections in original-frame pixels, already filtered by confidence.
    fn infer(&mut self, frame: &Frame) -> ServiceResult<Vec<RawDetection>>;
}

/// YuNet 320x320 with a single `[N, 15]` output.
pub struct YuNetModel {
    session: Session,
    confidence_threshold: f64,
}

impl YuNetModel {
    /// Load the model from disk.
    pub fn load(model_path: &Path, confidence_threshold: f64) -> ServiceResult<Self> {
        if !model_path.exists() {
            return Err(ServiceError::ModelNotFound(model_path.to_path_buf()));
        }

        let model_bytes = std::fs::read(model_path)
            .map_err(|e| ServiceError::model_load(format!("read {}: {}", model_path.display(), e)))?;

        let session = Session::builder()
            .map_err(|e| ServiceError::model_load(format!("session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ServiceError::model_load(format!("optimization level: {e}")))?
            .commit_from_memory(model_bytes.as_slice())
            .map_err(|e| ServiceError::model_load(format!("load model: {e}")))?;

        info!(
            "[DETECTOR] Loaded {} (confidence >= {})",
            model_path.display(),
            confidence_threshold
        );

        Ok(Self {
            session,
            confidence_threshold,
        })
    }
}

impl FaceModel for YuNetModel {
    fn infer(&mut self, frame: &Frame) -> ServiceResult<Vec<RawDetection>> {
        let input = preprocess(frame, INPUT_SIZE)?;
        let size = INPUT_SIZE as usize;
        let tensor: Value = Tensor::from_array((vec![1usize, 3, size, size], input.into_boxed_slice()))
            .map(Value::from)
            .map_err(|e| ServiceError::inference(format!("create tensor: {e}")))?;

        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .map_err(|e| ServiceError::inference(format!("run: {e}")))?;

        if outputs.len() == 0 {
            return Err(ServiceError::inference("model returned no outputs"));
        }

        let (_, rows) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ServiceError::inference(format!("extract output: {e}")))?;

        Ok(decode_detections(
            rows,
            frame.width(),
            frame.height(),
            INPUT_SIZE,
            self.confidence_threshold,
        ))
    }
}

/// Resize to `size`x`size` and lay out as normalized NCHW floats.
pub fn preprocess(frame: &Frame, size: u32) -> ServiceResult<Vec<f32>> {
    let image: ImageBuffer<Rgb<u8>, &[u8]> =
        ImageBuffer::from_raw(frame.width(), frame.height(), frame.data())
            .ok_or_else(|| ServiceError::internal("frame buffer does not match its dimensions"))?;

    let resized = imageops::resize(&image, size, size, FilterType::Triangle);

    let plane = size as usize * size as usize;
    let mut chw = vec![0f32; 3 * plane];
    for (i, pixel) in resized.pixels().enumerate() {
        for c in 0..3 {
            chw[c * plane + i] = f32::from(pixel[c]) / 255.0;
        }
    }
    Ok(chw)
}

/// Turn flattened `[N, 15]` rows into detections scaled back to the frame.
///
/// Trailing values that don't form a whole row are ignored.
pub fn decode_detections(
    rows: &[f32],
    frame_width: u32,
    frame_height: u32,
    input_size: u32,
    confidence_threshold: f64,
) -> Vec<RawDetection> {
    let scale_x = f64::from(frame_width) / f64::from(input_size);
    let scale_y = f64::from(frame_height) / f64::from(input_size);

    rows.chunks_exact(ROW_LEN)
        .filter_map(|row| {
            let confidence = f64::from(row[4]);
            if confidence.is_nan() || confidence < confidence_threshold {
                return None;
            }

            let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
            for (slot, pair) in landmarks.iter_mut().zip(row[5..].chunks_exact(2)) {
                *slot = Landmark::new(f64::from(pair[0]) * scale_x, f64::from(pair[1]) * scale_y);
            }

            Some(
                RawDetection::new(
                    f64::from(row[0]) * scale_x,
                    f64::from(row[1]) * scale_y,
                    f64::from(row[2]) * scale_x,
                    f64::from(row[3]) * scale_y,
                    confidence.min(1.0),
                )
                .with_landmarks(landmarks),
            )
        })
        .collect()
}
