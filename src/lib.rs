//! Multi-pollutant air quality forecasting
//!
//! Simulated or supplied hourly observations are turned into a fixed feature
//! layout, one regressor per pollutant is trained and selected on held-out
//! error, and trained models are rolled forward hour by hour. Forecasts are
//! summarised as a composite Air Quality Index.

pub mod api;
pub mod aqi;
pub mod config;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod ml;
pub mod service;
pub mod simulation;
pub mod telemetry;

pub use error::{AirQualityError, Result};
