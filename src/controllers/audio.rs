use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
};
use std::sync::Arc;

use crate::{
    domain::synthesis::SynthesisService,
    error::{AppError, AppResult},
};

/// GET /api/audio/:file_name - Download a produced audio file
pub async fn download(
    State(synthesis_service): State<Arc<SynthesisService>>,
    Path(file_name): Path<String>,
) -> AppResult<(StatusCode, HeaderMap, Body)> {
    let path = synthesis_service
        .output_file(&file_name)
        .ok_or_else(|| AppError::NotFound(format!("Audio file {}", file_name)))?;

    let audio = match tokio::fs::read(&path).await {
        Ok(audio) => audio,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!("Audio file {}", file_name)));
        }
        Err(e) => return Err(AppError::Internal(format!("Failed to read audio: {}", e))),
    };

    tracing::debug!(file_name = %file_name, size_bytes = audio.len(), "Serving audio file");

    // Build headers
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/wav"));
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file_name))
        .map_err(|e| AppError::Internal(e.to_string()))?;
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    Ok((StatusCode::OK, headers, Body::from(audio)))
}
