//! ML Model Training Pipeline
//!
//! Fits one model per pollutant. Every pollutant is trained independently
//! (in parallel) from the same engineered feature matrix; a failure for one
//! pollutant is recorded and never aborts the others.

use anyhow::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::models::{RegressionModel, Regressor, TrainedModel, TrainedModelSet};
use super::smartcore::{BoostedRegressor, BoostingParams, ForestParams, ForestRegressor};
use super::{ModelFamily, ModelMetadata, StandardScaler, ValidationMetrics};
use crate::domain::{ObservationSeries, Pollutant};
use crate::error::AirQualityError;
use crate::forecast::features::{FeatureFrame, FeaturePipeline};

/// Training Configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrainingConfig {
    /// Fraction of usable rows held out (from the end of the series)
    pub holdout_fraction: f64,
    /// Pollutants with fewer usable rows are skipped
    pub min_rows: usize,
    pub forest: ForestParams,
    pub boosting: BoostingParams,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            holdout_fraction: 0.2,
            min_rows: 2,
            forest: ForestParams::default(),
            boosting: BoostingParams::default(),
        }
    }
}

/// Chronological train/held-out split of one pollutant's usable rows
#[derive(Debug, Clone)]
pub struct TrainingDataset {
    pub train_x: Vec<Vec<f64>>,
    pub train_y: Vec<f64>,
    pub test_x: Vec<Vec<f64>>,
    pub test_y: Vec<f64>,
}

impl TrainingDataset {
    /// Keep temporal order: the held-out rows are the last
    /// `ceil(n * holdout_fraction)` rows, bounded so both sides are non-empty.
    pub fn split(x: Vec<Vec<f64>>, y: Vec<f64>, holdout_fraction: f64) -> Result<Self> {
        if x.len() != y.len() {
            anyhow::bail!(
                "Feature and target count mismatch: {} features, {} targets",
                x.len(),
                y.len()
            );
        }
        if y.len() < 2 {
            anyhow::bail!("Need at least 2 rows to split, got {}", y.len());
        }
        if holdout_fraction <= 0.0 || holdout_fraction >= 1.0 {
            anyhow::bail!("Holdout fraction must be between 0 and 1");
        }

        let n = y.len();
        let n_test = ((n as f64 * holdout_fraction).ceil() as usize).clamp(1, n - 1);
        let split_idx = n - n_test;

        let mut train_x = x;
        let test_x = train_x.split_off(split_idx);
        let mut train_y = y;
        let test_y = train_y.split_off(split_idx);

        Ok(Self {
            train_x,
            train_y,
            test_x,
            test_y,
        })
    }
}

/// A fitted candidate and its held-out score
struct Candidate<M> {
    model: M,
    metrics: ValidationMetrics,
}

fn fit_candidate<M: RegressionModel>(
    params: &M::Params,
    dataset: &TrainingDataset,
) -> Result<Candidate<M>> {
    let model = M::fit(&dataset.train_x, &dataset.train_y, params)?;
    let predictions = model.predict(&dataset.test_x)?;
    let metrics = ValidationMetrics::calculate(&predictions, &dataset.test_y)?;
    debug!(family = %M::FAMILY, mae = metrics.mae, "candidate fitted");
    Ok(Candidate { model, metrics })
}

/// Pick the lower held-out MAE; `first` wins ties
fn select<A, B>(first: Candidate<A>, second: Candidate<B>) -> (Regressor, ValidationMetrics, f64)
where
    A: RegressionModel + Into<Regressor>,
    B: RegressionModel + Into<Regressor>,
{
    if second.metrics.mae < first.metrics.mae {
        (second.model.into(), second.metrics, first.metrics.mae)
    } else {
        (first.model.into(), first.metrics, second.metrics.mae)
    }
}

/// Outcome of training one pollutant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingSummary {
    pub pollutant: Pollutant,
    pub model_id: String,
    pub family: ModelFamily,
    pub mae: f64,
    pub runner_up_mae: f64,
    pub training_samples: usize,
    pub holdout_samples: usize,
}

/// A pollutant that produced no model, and why
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkippedPollutant {
    pub pollutant: Pollutant,
    pub reason: String,
}

/// Aggregate result of a training batch
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrainingReport {
    pub trained: Vec<TrainingSummary>,
    pub skipped: Vec<SkippedPollutant>,
}

pub struct TrainingOutcome {
    pub models: TrainedModelSet,
    pub report: TrainingReport,
}

/// Model Trainer
pub struct ModelTrainer {
    config: TrainingConfig,
    pipeline: FeaturePipeline,
}

impl ModelTrainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            pipeline: FeaturePipeline::new(),
        }
    }

    /// Train every pollutant; partial results are a normal outcome
    pub fn train(&self, series: &ObservationSeries) -> TrainingOutcome {
        let frame = self.pipeline.augment(series);
        let matrix = frame.feature_matrix(self.pipeline.layout());

        let results: Vec<(Pollutant, Result<TrainedModel, AirQualityError>)> = Pollutant::ALL
            .as_slice()
            .par_iter()
            .map(|&pollutant| (pollutant, self.train_pollutant(pollutant, &frame, &matrix)))
            .collect();

        let mut models = Vec::new();
        let mut report = TrainingReport::default();
        for (pollutant, result) in results {
            match result {
                Ok(model) => {
                    info!(
                        pollutant = %pollutant,
                        family = %model.family(),
                        mae = model.metadata.validation_metrics.mae,
                        runner_up_mae = model.metadata.runner_up_mae,
                        "trained pollutant model"
                    );
                    report.trained.push(TrainingSummary {
                        pollutant,
                        model_id: model.metadata.model_id.clone(),
                        family: model.family(),
                        mae: model.metadata.validation_metrics.mae,
                        runner_up_mae: model.metadata.runner_up_mae,
                        training_samples: model.metadata.training_samples,
                        holdout_samples: model.metadata.holdout_samples,
                    });
                    models.push(model);
                }
                Err(e) => {
                    warn!(pollutant = %pollutant, error = %e, "skipping pollutant");
                    report.skipped.push(SkippedPollutant {
                        pollutant,
                        reason: e.to_string(),
                    });
                }
            }
        }

        TrainingOutcome {
            models: TrainedModelSet::new(models),
            report,
        }
    }

    /// Fit both candidate families for one pollutant and keep the better one
    fn train_pollutant(
        &self,
        pollutant: Pollutant,
        frame: &FeatureFrame,
        matrix: &[Vec<f64>],
    ) -> Result<TrainedModel, AirQualityError> {
        let (x, y): (Vec<Vec<f64>>, Vec<f64>) = frame
            .target(pollutant)
            .into_iter()
            .zip(matrix)
            .filter_map(|(target, row)| target.map(|t| (row.clone(), t)))
            .unzip();

        if y.len() < self.config.min_rows.max(2) {
            return Err(AirQualityError::EmptyTrainingSet {
                pollutant,
                rows: y.len(),
            });
        }

        let mut dataset = TrainingDataset::split(x, y, self.config.holdout_fraction)?;
        let scaler = StandardScaler::fit(&dataset.train_x)?;
        dataset.train_x = scaler.transform(&dataset.train_x)?;
        dataset.test_x = scaler.transform(&dataset.test_x)?;

        let forest = fit_candidate::<ForestRegressor>(&self.config.forest, &dataset)?;
        let boosted = fit_candidate::<BoostedRegressor>(&self.config.boosting, &dataset)?;
        let (regressor, metrics, runner_up_mae) = select(forest, boosted);

        let metadata = ModelMetadata {
            model_id: format!("{}_{}", pollutant, uuid::Uuid::new_v4()),
            family: regressor.family(),
            trained_at: chrono::Utc::now(),
            training_samples: dataset.train_y.len(),
            holdout_samples: dataset.test_y.len(),
            validation_metrics: metrics,
            runner_up_mae,
        };

        Ok(TrainedModel::new(
            pollutant,
            metadata,
            self.pipeline.layout().names().to_vec(),
            scaler,
            regressor,
        )?)
    }
}
