use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::domain::ObservationRecord;
use crate::ml::TrainingReport;
use crate::service::{AppState, TrainingSource};

#[derive(Debug, Default, Deserialize)]
pub struct TrainRequest {
    /// Hourly records to train on; simulated data is used when absent
    pub training_data: Option<Vec<ObservationRecord>>,
    pub n_samples: Option<usize>,
}

impl TrainRequest {
    /// Resolve the training source, bounding its size by `max_samples`
    pub fn source(self, default_samples: usize, max_samples: usize) -> Result<TrainingSource, ApiError> {
        match self.training_data {
            Some(records) if records.len() > max_samples => Err(ApiError::BadRequest(format!(
                "training_data may hold at most {} records, got {}",
                max_samples,
                records.len()
            ))),
            Some(records) => Ok(TrainingSource::Records(records)),
            None => {
                let n = self.n_samples.unwrap_or(default_samples);
                if n == 0 || n > max_samples {
                    return Err(ApiError::BadRequest(format!(
                        "n_samples must be between 1 and {}, got {}",
                        max_samples, n
                    )));
                }
                Ok(TrainingSource::Simulated(n))
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TrainResponse {
    pub status: &'static str,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub report: TrainingReport,
}

/// POST /train - Retrain, persist and swap in a new model set
pub async fn retrain(
    State(state): State<AppState>,
    request: Option<Json<TrainRequest>>,
) -> Result<Json<TrainResponse>, ApiError> {
    let models = &state.cfg.models;
    let source = request
        .map(|Json(r)| r)
        .unwrap_or_default()
        .source(models.bootstrap_samples, models.max_samples)?;

    let service = state.service.clone();
    let report = tokio::task::spawn_blocking(move || service.retrain(source)).await??;

    Ok(Json(TrainResponse {
        status: "success",
        message: format!(
            "Models retrained successfully ({} trained, {} skipped)",
            report.trained.len(),
            report.skipped.len()
        ),
        timestamp: Utc::now(),
        report,
    }))
}
