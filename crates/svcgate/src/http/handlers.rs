use std::path::Path;

use axum::extract::{Multipart, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use svcgate_core::config::ResponseMode;

use super::error::ApiError;
use super::form::ProcessAudioForm;
use super::request_id::RequestId;
use super::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProcessComplete {
    pub message: String,
    pub output_file: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub engine: String,
    pub presets: usize,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct PresetList {
    pub models: Vec<String>,
}

/// POST /process-audio/ - convert an uploaded recording
#[tracing::instrument(skip_all, fields(request_id = %request_id.0))]
pub async fn process_audio(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let request = ProcessAudioForm::from_multipart(multipart)
        .await?
        .into_request()?;

    tracing::debug!(
        filename = %request.filename,
        bytes = request.data.len(),
        model_name = ?request.model_name,
        output = %request.output,
        "Conversion request received"
    );

    let output = state.service.convert(request).await?;

    match state.response {
        ResponseMode::Json => Ok(Json(ProcessComplete {
            message: "Processing complete".to_string(),
            output_file: output.display().to_string(),
        })
        .into_response()),
        ResponseMode::File => audio_file_response(&output).await,
    }
}

async fn audio_file_response(path: &Path) -> Result<Response, ApiError> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to read output file: {}", e)))?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().replace('"', "_"))
        .unwrap_or_else(|| "output.wav".to_string());
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("audio/wav")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    )
        .into_response())
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        engine: state.service.engine_kind().to_string(),
        presets: state.service.catalog().len(),
        started_at: state.started_at,
    })
}

/// GET /presets
pub async fn list_presets(State(state): State<AppState>) -> Json<PresetList> {
    Json(PresetList {
        models: state.service.catalog().names().map(String::from).collect(),
    })
}
