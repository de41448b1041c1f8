//! # Environment Simulator
//!
//! Produces a labeled hourly series of weather and pollutant concentrations
//! with seasonal and diurnal structure. Used to bootstrap training when no
//! historical dataset is supplied.
//!
//! All randomness comes from a `StdRng` seeded from the configuration, so a
//! given config always yields the same series.

use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::domain::{ObservationRecord, ObservationSeries, Pollutant, TemporalContext};

/// Simulator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Timestamp of the first generated record
    pub start_time: NaiveDateTime,
    /// Seed for every random draw of a `generate` call
    pub random_seed: u64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            start_time: NaiveDate::from_ymd_opt(2020, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap_or_default(),
            random_seed: 42,
        }
    }
}

impl EnvironmentConfig {
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }
}

/// Noise sources, one per generated quantity
struct NoiseModel {
    temperature: Normal<f64>,
    humidity: Normal<f64>,
    wind: Exp<f64>,
    pressure: Normal<f64>,
    pm25: Normal<f64>,
    pm10: Normal<f64>,
    co2: Normal<f64>,
    no2: Normal<f64>,
    so2: Normal<f64>,
    o3: Normal<f64>,
}

impl NoiseModel {
    fn new() -> Result<Self> {
        Ok(Self {
            temperature: Normal::new(0.0, 5.0)?,
            humidity: Normal::new(0.0, 10.0)?,
            wind: Exp::new(1.0)?,
            pressure: Normal::new(0.0, 15.0)?,
            pm25: Normal::new(0.0, 8.0)?,
            pm10: Normal::new(0.0, 5.0)?,
            co2: Normal::new(0.0, 20.0)?,
            no2: Normal::new(0.0, 5.0)?,
            so2: Normal::new(0.0, 3.0)?,
            o3: Normal::new(0.0, 8.0)?,
        })
    }
}

/// Synthetic weather and pollution generator
pub struct EnvironmentSimulator {
    config: EnvironmentConfig,
    noise: NoiseModel,
}

impl EnvironmentSimulator {
    pub fn new(config: EnvironmentConfig) -> Result<Self> {
        Ok(Self {
            config,
            noise: NoiseModel::new()?,
        })
    }

    /// Generate `n_samples` hourly records starting at the configured epoch
    pub fn generate(&self, n_samples: usize) -> ObservationSeries {
        let mut rng = StdRng::seed_from_u64(self.config.random_seed);

        let records = (0..n_samples)
            .map(|i| {
                let timestamp = self.config.start_time + Duration::hours(i as i64);
                self.sample(timestamp, &mut rng)
            })
            .collect();

        // Hourly steps from a fixed start are strictly increasing
        ObservationSeries::new(records).unwrap_or_default()
    }

    fn sample(&self, timestamp: NaiveDateTime, rng: &mut StdRng) -> ObservationRecord {
        let temporal = TemporalContext::from_timestamp(timestamp);
        let day_of_year = timestamp.ordinal() as f64;
        let noise = &self.noise;

        let temperature =
            15.0 + 10.0 * (2.0 * PI * (day_of_year - 80.0) / 365.0).sin() + noise.temperature.sample(rng);
        let humidity = (50.0 + 20.0 * (2.0 * PI * day_of_year / 365.0).sin()
            + noise.humidity.sample(rng))
        .clamp(20.0, 90.0);
        let wind_speed = (5.0 + 3.0 * noise.wind.sample(rng)).clamp(0.0, 20.0);
        let pressure = 1013.0 + noise.pressure.sample(rng);

        let rush_hour = is_rush_hour(temporal.hour);
        let flag = |on: bool| if on { 1.0 } else { 0.0 };

        let pm25_base = 25.0
            + 15.0 * flag(temporal.season == 0 || temporal.season == 3)
            + 10.0 * flag(rush_hour)
            + (15.0 - wind_speed).max(0.0);
        let pm25 = (pm25_base + noise.pm25.sample(rng)).max(0.0);

        let pm10 = (pm25 * 1.5 + noise.pm10.sample(rng)).max(0.0);

        let co2_base = 400.0
            + 50.0 * flag((6..=22).contains(&temporal.hour))
            + 30.0 * flag(rush_hour);
        let co2 = (co2_base + noise.co2.sample(rng)).max(0.0);

        let no2_base = 20.0 + 15.0 * flag(rush_hour) + 10.0 * flag(temporal.is_weekday());
        let no2 = (no2_base + noise.no2.sample(rng)).max(0.0);

        let so2_base = 10.0 + 5.0 * flag(temporal.season == 0);
        let so2 = (so2_base + noise.so2.sample(rng)).max(0.0);

        let o3_base = 30.0
            + 20.0 * flag(temporal.season == 1)
            + 15.0 * flag((10..=16).contains(&temporal.hour));
        let o3 = (o3_base + noise.o3.sample(rng)).max(0.0);

        ObservationRecord::new(timestamp, temperature, humidity, wind_speed, pressure)
            .with_reading(Pollutant::Pm25, pm25)
            .with_reading(Pollutant::Pm10, pm10)
            .with_reading(Pollutant::Co2, co2)
            .with_reading(Pollutant::No2, no2)
            .with_reading(Pollutant::So2, so2)
            .with_reading(Pollutant::O3, o3)
    }
}

/// Morning (07-09) and evening (17-19) traffic peaks
fn is_rush_hour(hour: u32) -> bool {
    (7..=9).contains(&hour) || (17..=19).contains(&hour)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn simulator(seed: u64) -> EnvironmentSimulator {
        EnvironmentSimulator::new(EnvironmentConfig::default().with_random_seed(seed)).unwrap()
    }

    #[test]
    fn test_hourly_records_from_epoch() {
        let series = simulator(42).generate(48);
        assert_eq!(series.len(), 48);

        let first = &series.records()[0];
        assert_eq!(first.timestamp, EnvironmentConfig::default().start_time);
        assert_eq!(series.records()[25].timestamp.hour(), 1);
        assert_eq!(
            series.records()[1].timestamp - first.timestamp,
            Duration::hours(1)
        );
    }

    #[test]
    fn test_deterministic_for_seed() {
        let a = simulator(7).generate(100);
        let b = simulator(7).generate(100);
        let c = simulator(8).generate(100);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_weather_bounds() {
        let series = simulator(42).generate(500);
        for record in series.records() {
            assert!((20.0..=90.0).contains(&record.humidity));
            assert!((5.0..=20.0).contains(&record.wind_speed));
        }
    }

    #[test]
    fn test_every_pollutant_present_and_non_negative() {
        let series = simulator(3).generate(24 * 30);
        for record in series.records() {
            for p in Pollutant::all() {
                let value = record.reading(p).unwrap();
                assert!(value >= 0.0, "{p} was negative: {value}");
            }
        }
    }

    #[test]
    fn test_co2_daytime_regime() {
        // Averaged over a month, daytime CO2 sits well above the night baseline
        let series = simulator(42).generate(24 * 30);
        let (mut day, mut night) = (Vec::new(), Vec::new());
        for record in series.records() {
            let co2 = record.reading(Pollutant::Co2).unwrap();
            if (6..=22).contains(&record.temporal().hour) {
                day.push(co2);
            } else {
                night.push(co2);
            }
        }
        let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;
        assert!(mean(&day) - mean(&night) > 30.0);
    }

    #[test]
    fn test_empty_request() {
        assert!(simulator(42).generate(0).is_empty());
    }

    #[test]
    fn test_rush_hours() {
        assert!(is_rush_hour(7));
        assert!(is_rush_hour(9));
        assert!(is_rush_hour(18));
        assert!(!is_rush_hour(10));
        assert!(!is_rush_hour(20));
    }
}
