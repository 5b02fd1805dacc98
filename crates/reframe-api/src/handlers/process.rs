//! Timeline processing handler.

use std::time::Instant;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::{error, info};

use reframe_media::{analyze_video, compress_timeline};
use reframe_models::TimelineRecord;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::security::resolve_video_path;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProcessQuery {
    /// Return only records where the mode changes.
    #[serde(default)]
    pub compact: bool,
}

/// `POST /process`: build the framing timeline for a stored video.
pub async fn process_video(
    State(state): State<AppState>,
    query: Result<Query<ProcessQuery>, QueryRejection>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<TimelineRecord>>> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let filename = request
        .filename
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ApiError::bad_request("No filename provided"))?;

    let video_path = resolve_video_path(&state.config.storage_root, &filename)
        .ok_or_else(|| ApiError::bad_request(format!("Invalid filename: {}", filename)))?;

    if !tokio::fs::try_exists(&video_path).await.unwrap_or(false) {
        return Err(ApiError::not_found(format!(
            "File not found: {}",
            video_path.display()
        )));
    }

    info!("[PROCESS] Processing video: {}", video_path.display());
    let started = Instant::now();

    let records = match analyze_video(&video_path, state.detector.as_ref(), state.framing).await {
        Ok(records) => records,
        Err(e) => {
            error!("[PROCESS] Failed to process {}: {}", video_path.display(), e);
            let reason = if e.is_decode_failure() { "decode" } else { "internal" };
            metrics::record_job_failed(reason);
            return Err(ApiError::from(e).redacted(state.config.is_production()));
        }
    };

    metrics::record_job_completed();
    info!(
        "[PROCESS] {} done in {:.2}s: {} records",
        filename,
        started.elapsed().as_secs_f64(),
        records.len()
    );

    if query.compact {
        Ok(Json(compress_timeline(&records)))
    } else {
        Ok(Json(records))
    }
}
