use std::collections::BTreeMap;

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aqi::{daily_summaries, hourly_index, DailySummary, HourlyAqi};
use crate::api::error::ApiError;
use crate::domain::{CurrentConditions, Pollutant};
use crate::service::AppState;

/// Forecast request body
///
/// Every condition field is required; they are optional here only so a
/// missing field produces a specific 400 rather than a generic decode error.
#[derive(Debug, Default, Deserialize)]
pub struct ForecastRequest {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub pressure: Option<f64>,
    pub hour: Option<u32>,
    pub day_of_week: Option<u32>,
    pub month: Option<u32>,
    pub season: Option<u32>,
    pub hours_ahead: Option<usize>,
    pub location: Option<String>,
}

impl ForecastRequest {
    pub fn conditions(&self) -> Result<CurrentConditions, ApiError> {
        let mut missing = Vec::new();
        fn take<T: Default>(value: Option<T>, name: &'static str, missing: &mut Vec<&'static str>) -> T {
            value.unwrap_or_else(|| {
                missing.push(name);
                T::default()
            })
        }

        let conditions = CurrentConditions {
            temperature: take(self.temperature, "temperature", &mut missing),
            humidity: take(self.humidity, "humidity", &mut missing),
            wind_speed: take(self.wind_speed, "wind_speed", &mut missing),
            pressure: take(self.pressure, "pressure", &mut missing),
            hour: take(self.hour, "hour", &mut missing),
            day_of_week: take(self.day_of_week, "day_of_week", &mut missing),
            month: take(self.month, "month", &mut missing),
            season: take(self.season, "season", &mut missing),
        };

        if !missing.is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }
        conditions.check()?;
        Ok(conditions)
    }

    pub fn hours_ahead(&self, default_hours: usize, max_hours: usize) -> Result<usize, ApiError> {
        let hours = self.hours_ahead.unwrap_or(default_hours);
        if hours == 0 || hours > max_hours {
            return Err(ApiError::BadRequest(format!(
                "hours_ahead must be between 1 and {}, got {}",
                max_hours, hours
            )));
        }
        Ok(hours)
    }
}

#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub timestamp: DateTime<Utc>,
    pub location: String,
    pub current_conditions: CurrentConditions,
    pub forecasts: BTreeMap<Pollutant, Vec<f64>>,
    pub hourly_aqi: Vec<HourlyAqi>,
    pub daily_summary: Vec<DailySummary>,
}

/// POST /forecast - Hourly pollutant forecast with AQI summaries
pub async fn forecast(
    State(state): State<AppState>,
    Json(request): Json<ForecastRequest>,
) -> Result<Json<ForecastResponse>, ApiError> {
    let conditions = request.conditions()?;
    let hours = request.hours_ahead(state.cfg.forecast.default_hours, state.cfg.forecast.max_hours)?;

    let service = state.service.clone();
    let trajectory =
        tokio::task::spawn_blocking(move || service.forecast(&conditions, hours)).await??;

    let timestamp = Utc::now();
    let hourly_aqi = hourly_index(&trajectory, timestamp, state.cfg.forecast.hourly_aqi_hours);
    let daily_summary = daily_summaries(&trajectory, timestamp, state.cfg.forecast.summary_days);

    tracing::info!(hours, pollutants = trajectory.pollutants().len(), "forecast served");

    Ok(Json(ForecastResponse {
        timestamp,
        location: request.location.unwrap_or_else(|| "Unknown".to_string()),
        current_conditions: conditions,
        forecasts: trajectory.into_inner(),
        hourly_aqi,
        daily_summary,
    }))
}
