//! Detector wire protocol.
//!
//! Every message is a MessagePack map preceded by its length as a 4-byte
//! big-endian integer. A connection carries exactly one request followed by
//! exactly one response.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use reframe_models::{Frame, Landmark, RawDetection, LANDMARK_COUNT};

use crate::error::{DetectorError, DetectorResult};

/// Upper bound for a single message (fits a 4K RGB24 frame with room to spare).
pub const MAX_MESSAGE_BYTES: usize = 64 * 1024 * 1024;

/// Frame submitted for inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceRequest {
    #[serde(rename = "h")]
    pub height: u32,
    #[serde(rename = "w")]
    pub width: u32,
    /// RGB24, row-major, `height * width * 3` bytes
    #[serde(rename = "d", with = "serde_bytes")]
    pub data: Vec<u8>,
}

impl InferenceRequest {
    pub fn from_frame(frame: &Frame) -> Self {
        Self {
            height: frame.height(),
            width: frame.width(),
            data: frame.data().to_vec(),
        }
    }

    /// Rebuild the frame on the receiving side.
    pub fn into_frame(self) -> DetectorResult<Frame> {
        Frame::new(self.width, self.height, self.data)
            .map_err(|e| DetectorError::invalid_response(e.to_string()))
    }
}

/// One face as it crosses the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireDetection {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    /// Confidence
    pub c: f64,
    /// Landmarks as `[x1, y1, ..., x5, y5]`
    #[serde(default)]
    pub l: Vec<f64>,
}

impl WireDetection {
    pub fn from_detection(det: &RawDetection) -> Self {
        Self {
            x: det.x,
            y: det.y,
            w: det.width,
            h: det.height,
            c: det.confidence,
            l: det.landmarks.iter().flat_map(|p| [p.x, p.y]).collect(),
        }
    }

    /// Validate and convert into the engine's detection type.
    pub fn into_detection(self) -> DetectorResult<RawDetection> {
        let values = [self.x, self.y, self.w, self.h, self.c];
        if values.iter().chain(self.l.iter()).any(|v| !v.is_finite()) {
            return Err(DetectorError::invalid_response("non-finite detection value"));
        }
        if !(0.0..=1.0).contains(&self.c) {
            return Err(DetectorError::invalid_response(format!(
                "confidence {} outside [0, 1]",
                self.c
            )));
        }
        if self.w < 0.0 || self.h < 0.0 {
            return Err(DetectorError::invalid_response("negative box size"));
        }

        // Short landmark lists leave the remaining points at the origin.
        let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
        for (slot, pair) in landmarks.iter_mut().zip(self.l.chunks_exact(2)) {
            *slot = Landmark::new(pair[0], pair[1]);
        }

        Ok(RawDetection::new(self.x, self.y, self.w, self.h, self.c).with_landmarks(landmarks))
    }
}

/// Detector reply for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResponse {
    pub detections: Vec<WireDetection>,
    #[serde(default)]
    pub inference_ms: f64,
}

/// Write one length-prefixed message.
pub async fn write_message<W, T>(writer: &mut W, message: &T) -> DetectorResult<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let payload = rmp_serde::to_vec_named(message)?;
    if payload.len() > MAX_MESSAGE_BYTES {
        return Err(DetectorError::MessageTooLarge {
            size: payload.len(),
            limit: MAX_MESSAGE_BYTES,
        });
    }

    writer.write_u32(payload.len() as u32).await?;
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed message.
pub async fn read_message<R, T>(reader: &mut R) -> DetectorResult<T>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let size = reader.read_u32().await? as usize;
    if size > MAX_MESSAGE_BYTES {
        return Err(DetectorError::MessageTooLarge {
            size,
            limit: MAX_MESSAGE_BYTES,
        });
    }

    let mut payload = vec![0u8; size];
    reader.read_exact(&mut payload).await?;
    Ok(rmp_serde::from_slice(&payload)?)
}
