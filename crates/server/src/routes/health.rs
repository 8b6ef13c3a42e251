//! Health check endpoint

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub symptoms: usize,
    pub conditions: usize,
    pub doctors: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// GET /health - Report whether reference data is loaded
pub async fn check(State(state): State<AppState>) -> impl IntoResponse {
    let knowledge = state.engine.knowledge();
    let doctors = state.appointments.doctors().len();

    let reason = if knowledge.symptoms.is_empty() {
        Some("No symptom reference data loaded".to_string())
    } else if doctors == 0 {
        Some("No doctors available for booking".to_string())
    } else {
        None
    };

    let status = if reason.is_some() {
        tracing::warn!(reason = ?reason, "Health check failed");
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        status,
        Json(HealthResponse {
            status: if reason.is_some() { "unhealthy" } else { "healthy" }.to_string(),
            symptoms: knowledge.symptoms.len(),
            conditions: knowledge.treatments.len(),
            doctors,
            reason,
        }),
    )
}
