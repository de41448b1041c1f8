use std::collections::BTreeMap;

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::aqi::{composite_index, AqiCategory};
use crate::api::error::ApiError;
use crate::domain::Pollutant;

#[derive(Debug, Deserialize)]
pub struct AqiRequest {
    pub concentrations: BTreeMap<Pollutant, f64>,
}

#[derive(Debug, Serialize)]
pub struct AqiResponse {
    pub aqi: u16,
    pub level: AqiCategory,
    pub recommendation: &'static str,
    pub dominant_pollutant: Option<Pollutant>,
}

/// POST /aqi - Composite index for a set of concentrations
pub async fn calculate_aqi(Json(request): Json<AqiRequest>) -> Result<Json<AqiResponse>, ApiError> {
    if let Some((pollutant, value)) = request
        .concentrations
        .iter()
        .find(|(_, v)| !v.is_finite() || **v < 0.0)
    {
        return Err(ApiError::BadRequest(format!(
            "Concentration for {} must be a non-negative number, got {}",
            pollutant, value
        )));
    }

    let result = composite_index(&request.concentrations);
    Ok(Json(AqiResponse {
        aqi: result.aqi,
        level: result.category,
        recommendation: result.category.recommendation(),
        dominant_pollutant: result.dominant_pollutant,
    }))
}
