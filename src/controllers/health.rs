use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use crate::domain::synthesis::SynthesisService;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// The model is loaded before the server binds; after that the server is
/// ready for as long as the model can take calls.
pub async fn health_ready(State(synthesis_service): State<Arc<SynthesisService>>) -> impl IntoResponse {
    let device = synthesis_service.device();
    let (status, label) = if synthesis_service.model_available() {
        (StatusCode::OK, "ready")
    } else {
        tracing::warn!(model = synthesis_service.model_name(), "Readiness check failed: model unavailable");
        (StatusCode::SERVICE_UNAVAILABLE, "not_ready")
    };

    (
        status,
        Json(json!({
            "status": label,
            "model": synthesis_service.model_name(),
            "device": device.as_str(),
            "device_label": device.label(),
            "languages": synthesis_service
                .languages()
                .iter()
                .map(|l| l.as_str())
                .collect::<Vec<_>>(),
        })),
    )
}
