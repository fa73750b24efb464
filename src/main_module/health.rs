//! Health check handler

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;

use crate::shared::state::AppState;

/// Reports the configured model and detector so callers can confirm what the
/// engine will be asked to run, without issuing a full request.
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "model": state.config.model_name,
            "detector": state.config.detector_backend,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}
