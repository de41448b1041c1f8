use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::domain::Pollutant;
use crate::service::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    timestamp: chrono::DateTime<chrono::Utc>,
    trained_pollutants: Vec<Pollutant>,
}

/// GET /health - Health check endpoint
///
/// Degraded (503) while no pollutant has a model.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let trained_pollutants = state.service.models().pollutants();
    let healthy = !trained_pollutants.is_empty();

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        timestamp: chrono::Utc::now(),
        trained_pollutants,
    };

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
