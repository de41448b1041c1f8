use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use super::features::{DerivedFeature, FeatureLayout, FeaturePipeline};
use crate::domain::{CurrentConditions, Pollutant};
use crate::error::{AirQualityError, Result};
use crate::ml::{FeatureVector, TrainedModel, TrainedModelSet};

/// How the feature row evolves between forecast steps
///
/// `history` holds every prediction made so far for `pollutant`, most recent
/// last. Implementations update `row` in place for the next step.
pub trait FutureConditions: Send + Sync {
    fn advance(&self, pollutant: Pollutant, layout: &FeatureLayout, row: &mut [f64], history: &[f64]);
}

/// Freezes weather and calendar features and feeds the pollutant's own
/// predictions back into its lag and rolling slots.
///
/// Future weather is not simulated, and other pollutants' slots stay at
/// their seeded values.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnLagFeedback;

impl FutureConditions for OwnLagFeedback {
    fn advance(&self, pollutant: Pollutant, layout: &FeatureLayout, row: &mut [f64], history: &[f64]) {
        let Some(&last) = history.last() else {
            return;
        };
        let mut set = |feature: DerivedFeature, value: f64| {
            if let Some(i) = layout.derived_index(pollutant, feature) {
                row[i] = value;
            }
        };

        set(DerivedFeature::Lag1, last);
        set(DerivedFeature::Rolling3h, trailing_mean(history, 3));
        set(DerivedFeature::Rolling24h, trailing_mean(history, 24));
        if history.len() >= 24 {
            set(DerivedFeature::Lag24, history[history.len() - 24]);
        }
    }
}

fn trailing_mean(values: &[f64], window: usize) -> f64 {
    let tail = &values[values.len().saturating_sub(window)..];
    if tail.is_empty() {
        return 0.0;
    }
    tail.iter().sum::<f64>() / tail.len() as f64
}

/// Hourly predictions per trained pollutant
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ForecastTrajectory {
    hours: usize,
    series: BTreeMap<Pollutant, Vec<f64>>,
}

impl ForecastTrajectory {
    /// Assemble a trajectory from equal-length per-pollutant predictions
    pub fn from_series(series: BTreeMap<Pollutant, Vec<f64>>) -> Result<Self> {
        let hours = series.values().next().map_or(0, Vec::len);
        if series.values().any(|values| values.len() != hours) {
            return Err(AirQualityError::InvalidInput(
                "All pollutant trajectories must have the same length".to_string(),
            ));
        }
        Ok(Self { hours, series })
    }

    pub fn hours(&self) -> usize {
        self.hours
    }

    pub fn get(&self, pollutant: Pollutant) -> Option<&[f64]> {
        self.series.get(&pollutant).map(Vec::as_slice)
    }

    pub fn pollutants(&self) -> Vec<Pollutant> {
        self.series.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Pollutant, &[f64])> {
        self.series.iter().map(|(p, v)| (*p, v.as_slice()))
    }

    /// Concentrations of every forecast pollutant at one step
    pub fn at(&self, hour: usize) -> BTreeMap<Pollutant, f64> {
        self.series
            .iter()
            .filter_map(|(p, values)| values.get(hour).map(|v| (*p, *v)))
            .collect()
    }

    pub fn into_inner(self) -> BTreeMap<Pollutant, Vec<f64>> {
        self.series
    }
}

/// Rolls every trained pollutant forward hour by hour, feeding each
/// prediction into the next step's features.
pub struct RecursiveForecaster {
    pipeline: FeaturePipeline,
    feedback: Box<dyn FutureConditions>,
}

impl RecursiveForecaster {
    pub fn new() -> Self {
        Self::with_feedback(OwnLagFeedback)
    }

    pub fn with_feedback(feedback: impl FutureConditions + 'static) -> Self {
        Self {
            pipeline: FeaturePipeline::new(),
            feedback: Box::new(feedback),
        }
    }

    pub fn forecast(
        &self,
        models: &TrainedModelSet,
        conditions: &CurrentConditions,
        hours_ahead: usize,
    ) -> Result<ForecastTrajectory> {
        conditions.check()?;
        let seed = self.pipeline.conditions_vector(conditions);

        let trained: Vec<&TrainedModel> = models.iter().collect();
        let series = trained
            .into_par_iter()
            .map(|model| Ok((model.pollutant, self.roll_out(model, &seed, hours_ahead)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;

        debug!(pollutants = series.len(), hours_ahead, "forecast complete");
        Ok(ForecastTrajectory {
            hours: hours_ahead,
            series,
        })
    }

    fn roll_out(&self, model: &TrainedModel, seed: &FeatureVector, hours_ahead: usize) -> Result<Vec<f64>> {
        if model.feature_names != seed.feature_names {
            return Err(anyhow::anyhow!(
                "Model for {} was trained on a different feature layout",
                model.pollutant
            )
            .into());
        }

        let mut row = seed.features.clone();
        let mut history = Vec::with_capacity(hours_ahead);
        for _ in 0..hours_ahead {
            // f64::max maps NaN to 0 as well
            let value = model.predict_raw(&row)?.max(0.0);
            history.push(value);
            self.feedback
                .advance(model.pollutant, self.pipeline.layout(), &mut row, &history);
        }
        Ok(history)
    }
}

impl Default for RecursiveForecaster {
    fn default() -> Self {
        Self::new()
    }
}
