//! Machine Learning Module
//!
//! Per-pollutant regression models for air quality forecasting:
//! - Feature standardization fitted on training rows only
//! - Two candidate ensemble families compared on held-out error
//! - Immutable trained model sets with atomic replacement
//! - Artifact persistence
//!
//! # Architecture
//! - `training` fits and selects one model per pollutant
//! - `registry` holds the current model set for concurrent readers
//! - `persistence` writes and restores one artifact per pollutant

use anyhow::Result;
use serde::{Deserialize, Serialize};
use strum::Display;

pub mod models;
pub mod persistence;
pub mod registry;
pub mod scaler;
pub mod smartcore;
pub mod training;

pub use models::{RegressionModel, Regressor, TrainedModel, TrainedModelSet};
pub use registry::ModelStore;
pub use scaler::StandardScaler;
pub use training::{ModelTrainer, TrainingConfig, TrainingOutcome, TrainingReport};

/// Candidate regressor families
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
pub enum ModelFamily {
    RandomForest,
    GradientBoosting,
}

/// ML Model Metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelMetadata {
    pub model_id: String,
    pub family: ModelFamily,
    pub trained_at: chrono::DateTime<chrono::Utc>,
    pub training_samples: usize,
    pub holdout_samples: usize,
    /// Held-out metrics of the selected model
    pub validation_metrics: ValidationMetrics,
    /// Held-out MAE of the rejected candidate
    pub runner_up_mae: f64,
}

/// Validation Metrics
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ValidationMetrics {
    pub mae: f64,  // Mean Absolute Error
    pub rmse: f64, // Root Mean Square Error
    pub mape: f64, // Mean Absolute Percentage Error
    pub r2: f64,   // R-squared
}

impl ValidationMetrics {
    pub fn new(mae: f64, rmse: f64, mape: f64, r2: f64) -> Self {
        Self {
            mae,
            rmse,
            mape,
            r2,
        }
    }

    /// Compare predictions against observed targets
    pub fn calculate(predictions: &[f64], targets: &[f64]) -> Result<Self> {
        if predictions.len() != targets.len() {
            anyhow::bail!("Prediction and target count mismatch");
        }

        if predictions.is_empty() {
            anyhow::bail!("No predictions to evaluate");
        }

        let n = predictions.len() as f64;

        let mae: f64 = predictions
            .iter()
            .zip(targets.iter())
            .map(|(p, t)| (p - t).abs())
            .sum::<f64>()
            / n;

        let mse: f64 = predictions
            .iter()
            .zip(targets.iter())
            .map(|(p, t)| (p - t).powi(2))
            .sum::<f64>()
            / n;
        let rmse = mse.sqrt();

        let mape: f64 = predictions
            .iter()
            .zip(targets.iter())
            .filter(|(_, t)| t.abs() > 1e-10) // Avoid division by zero
            .map(|(p, t)| ((p - t) / t).abs() * 100.0)
            .sum::<f64>()
            / n;

        let mean_target: f64 = targets.iter().sum::<f64>() / n;
        let ss_tot: f64 = targets.iter().map(|t| (t - mean_target).powi(2)).sum();
        let ss_res: f64 = predictions
            .iter()
            .zip(targets.iter())
            .map(|(p, t)| (t - p).powi(2))
            .sum();

        let r2 = if ss_tot.abs() < 1e-10 {
            0.0
        } else {
            1.0 - (ss_res / ss_tot)
        };

        Ok(Self::new(mae, rmse, mape, r2))
    }
}

/// Feature Vector for ML models
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureVector {
    pub features: Vec<f64>,
    pub feature_names: Vec<String>,
}

impl FeatureVector {
    pub fn new(features: Vec<f64>, feature_names: Vec<String>) -> Result<Self> {
        if features.len() != feature_names.len() {
            anyhow::bail!(
                "Feature count mismatch: {} features, {} names",
                features.len(),
                feature_names.len()
            );
        }
        Ok(Self {
            features,
            feature_names,
        })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
