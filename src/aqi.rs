//! Air Quality Index calculation
//!
//! Piecewise-linear sub-indices per pollutant over fixed breakpoint tables;
//! the composite index is the worst sub-index.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::domain::Pollutant;
use crate::forecast::ForecastTrajectory;

pub const MAX_INDEX: f64 = 500.0;

/// One bracket of a breakpoint table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub c_lo: f64,
    pub c_hi: f64,
    pub i_lo: f64,
    pub i_hi: f64,
}

const fn bp(c_lo: f64, c_hi: f64, i_lo: f64, i_hi: f64) -> Breakpoint {
    Breakpoint {
        c_lo,
        c_hi,
        i_lo,
        i_hi,
    }
}

const PM25: [Breakpoint; 6] = [
    bp(0.0, 12.0, 0.0, 50.0),
    bp(12.1, 35.4, 51.0, 100.0),
    bp(35.5, 55.4, 101.0, 150.0),
    bp(55.5, 150.4, 151.0, 200.0),
    bp(150.5, 250.4, 201.0, 300.0),
    bp(250.5, 500.0, 301.0, 500.0),
];

const PM10: [Breakpoint; 6] = [
    bp(0.0, 54.0, 0.0, 50.0),
    bp(55.0, 154.0, 51.0, 100.0),
    bp(155.0, 254.0, 101.0, 150.0),
    bp(255.0, 354.0, 151.0, 200.0),
    bp(355.0, 424.0, 201.0, 300.0),
    bp(425.0, 604.0, 301.0, 500.0),
];

const CO2: [Breakpoint; 6] = [
    bp(0.0, 400.0, 0.0, 50.0),
    bp(401.0, 1000.0, 51.0, 100.0),
    bp(1001.0, 2000.0, 101.0, 150.0),
    bp(2001.0, 5000.0, 151.0, 200.0),
    bp(5001.0, 10000.0, 201.0, 300.0),
    bp(10001.0, 40000.0, 301.0, 500.0),
];

const NO2: [Breakpoint; 6] = [
    bp(0.0, 53.0, 0.0, 50.0),
    bp(54.0, 100.0, 51.0, 100.0),
    bp(101.0, 360.0, 101.0, 150.0),
    bp(361.0, 649.0, 151.0, 200.0),
    bp(650.0, 1249.0, 201.0, 300.0),
    bp(1250.0, 2049.0, 301.0, 500.0),
];

const SO2: [Breakpoint; 6] = [
    bp(0.0, 35.0, 0.0, 50.0),
    bp(36.0, 75.0, 51.0, 100.0),
    bp(76.0, 185.0, 101.0, 150.0),
    bp(186.0, 304.0, 151.0, 200.0),
    bp(305.0, 604.0, 201.0, 300.0),
    bp(605.0, 1004.0, 301.0, 500.0),
];

const O3: [Breakpoint; 6] = [
    bp(0.0, 54.0, 0.0, 50.0),
    bp(55.0, 70.0, 51.0, 100.0),
    bp(71.0, 85.0, 101.0, 150.0),
    bp(86.0, 105.0, 151.0, 200.0),
    bp(106.0, 200.0, 201.0, 300.0),
    bp(201.0, 400.0, 301.0, 500.0),
];

pub fn breakpoints(pollutant: Pollutant) -> &'static [Breakpoint] {
    match pollutant {
        Pollutant::Pm25 => &PM25,
        Pollutant::Pm10 => &PM10,
        Pollutant::Co2 => &CO2,
        Pollutant::No2 => &NO2,
        Pollutant::So2 => &SO2,
        Pollutant::O3 => &O3,
    }
}

/// Sub-index of one concentration
///
/// Concentrations between two brackets take the next bracket's lower index;
/// above the table they saturate at 500. Negative or non-finite readings
/// have no sub-index.
pub fn sub_index(pollutant: Pollutant, concentration: f64) -> Option<f64> {
    if !concentration.is_finite() || concentration < 0.0 {
        return None;
    }
    for b in breakpoints(pollutant) {
        if concentration <= b.c_hi {
            if concentration < b.c_lo {
                return Some(b.i_lo);
            }
            return Some((b.i_hi - b.i_lo) * (concentration - b.c_lo) / (b.c_hi - b.c_lo) + b.i_lo);
        }
    }
    Some(MAX_INDEX)
}

/// Health category ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter)]
pub enum AqiCategory {
    Good,
    Moderate,
    #[strum(serialize = "Unhealthy for Sensitive Groups")]
    #[serde(rename = "Unhealthy for Sensitive Groups")]
    UnhealthyForSensitiveGroups,
    Unhealthy,
    #[strum(serialize = "Very Unhealthy")]
    #[serde(rename = "Very Unhealthy")]
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    pub fn from_index(aqi: u16) -> Self {
        match aqi {
            0..=50 => AqiCategory::Good,
            51..=100 => AqiCategory::Moderate,
            101..=150 => AqiCategory::UnhealthyForSensitiveGroups,
            151..=200 => AqiCategory::Unhealthy,
            201..=300 => AqiCategory::VeryUnhealthy,
            _ => AqiCategory::Hazardous,
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Air quality is good. Ideal for outdoor activities.",
            AqiCategory::Moderate => {
                "Air quality is moderate. Sensitive individuals should consider limiting prolonged outdoor exertion."
            }
            AqiCategory::UnhealthyForSensitiveGroups => {
                "Unhealthy for sensitive groups. People with respiratory conditions should limit outdoor activity."
            }
            AqiCategory::Unhealthy => {
                "Unhealthy air quality. Everyone should reduce prolonged outdoor exertion."
            }
            AqiCategory::VeryUnhealthy => {
                "Very unhealthy air quality. Avoid outdoor activities. Stay indoors with air purifiers."
            }
            AqiCategory::Hazardous => {
                "Hazardous air quality. Avoid all outdoor activities. Emergency conditions."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AqiResult {
    pub aqi: u16,
    pub category: AqiCategory,
    /// Pollutant with the highest sub-index; `None` when nothing contributed
    pub dominant_pollutant: Option<Pollutant>,
}

/// Worst-pollutant composite index, clamped to [0, 500] and truncated
///
/// Readings in a gap between brackets still count (see [`sub_index`]), so a
/// CO2 forecast of 400.5 scores 51 rather than being dropped.
pub fn composite_index(concentrations: &BTreeMap<Pollutant, f64>) -> AqiResult {
    let mut worst: Option<(Pollutant, f64)> = None;
    for (&pollutant, &concentration) in concentrations {
        let Some(index) = sub_index(pollutant, concentration) else {
            continue;
        };
        if worst.map_or(true, |(_, w)| index > w) {
            worst = Some((pollutant, index));
        }
    }

    let aqi = worst
        .map(|(_, index)| index.clamp(0.0, MAX_INDEX) as u16)
        .unwrap_or(0);
    AqiResult {
        aqi,
        category: AqiCategory::from_index(aqi),
        dominant_pollutant: worst.map(|(p, _)| p),
    }
}

/// Composite index for one forecast hour
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyAqi {
    pub hour: usize,
    pub time: DateTime<Utc>,
    pub aqi: u16,
    pub level: AqiCategory,
    pub pollutants: BTreeMap<Pollutant, f64>,
}

/// Index for the first `limit` hours of a trajectory starting at `start`
pub fn hourly_index(trajectory: &ForecastTrajectory, start: DateTime<Utc>, limit: usize) -> Vec<HourlyAqi> {
    (0..trajectory.hours().min(limit))
        .map(|hour| {
            let pollutants = trajectory.at(hour);
            let result = composite_index(&pollutants);
            HourlyAqi {
                hour,
                time: start + Duration::hours(hour as i64),
                aqi: result.aqi,
                level: result.category,
                pollutants,
            }
        })
        .collect()
}

/// Per-day aggregate of hourly indices
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub day: usize,
    pub date: String,
    pub day_name: String,
    pub avg_aqi: u16,
    pub max_aqi: u16,
    pub level: AqiCategory,
    pub dominant_pollutant: Option<Pollutant>,
    pub recommendation: &'static str,
}

/// Summaries for up to `max_days` whole or partial days of a trajectory
///
/// The day's dominant pollutant is the one with the highest sub-index over
/// that day's mean concentrations.
pub fn daily_summaries(
    trajectory: &ForecastTrajectory,
    start: DateTime<Utc>,
    max_days: usize,
) -> Vec<DailySummary> {
    let hours = trajectory.hours();
    let mut summaries = Vec::new();

    for day in 0..max_days {
        let first = day * 24;
        if first >= hours || trajectory.is_empty() {
            break;
        }
        let last = ((day + 1) * 24).min(hours);

        let indices: Vec<u16> = (first..last)
            .map(|hour| composite_index(&trajectory.at(hour)).aqi)
            .collect();
        let avg_aqi = (indices.iter().map(|&i| f64::from(i)).sum::<f64>() / indices.len() as f64) as u16;
        let max_aqi = indices.iter().copied().max().unwrap_or(0);

        let means: BTreeMap<Pollutant, f64> = trajectory
            .iter()
            .filter(|(_, values)| values.len() >= last)
            .map(|(p, values)| {
                let window = &values[first..last];
                (p, window.iter().sum::<f64>() / window.len() as f64)
            })
            .collect();

        let level = AqiCategory::from_index(avg_aqi);
        let date = start + Duration::days(day as i64);
        summaries.push(DailySummary {
            day,
            date: date.format("%Y-%m-%d").to_string(),
            day_name: date.format("%A").to_string(),
            avg_aqi,
            max_aqi,
            level,
            dominant_pollutant: composite_index(&means).dominant_pollutant,
            recommendation: level.recommendation(),
        });
    }

    summaries
}
