//! ML Model Definitions
//!
//! The regression capability shared by both candidate families, and the
//! immutable per-pollutant models produced by training.

use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::smartcore::{BoostedRegressor, ForestRegressor};
use super::{FeatureVector, ModelFamily, ModelMetadata, StandardScaler};
use crate::domain::Pollutant;

/// A regressor that can be fitted on a feature matrix and queried for
/// predictions
pub trait RegressionModel: Sized + Send + Sync {
    type Params: Send + Sync;

    const FAMILY: ModelFamily;

    fn fit(x: &[Vec<f64>], y: &[f64], params: &Self::Params) -> Result<Self>;

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>>;
}

/// A fitted regressor of either family
#[derive(Debug, Serialize, Deserialize)]
pub enum Regressor {
    RandomForest(ForestRegressor),
    GradientBoosting(BoostedRegressor),
}

impl Regressor {
    pub fn family(&self) -> ModelFamily {
        match self {
            Regressor::RandomForest(_) => ModelFamily::RandomForest,
            Regressor::GradientBoosting(_) => ModelFamily::GradientBoosting,
        }
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        match self {
            Regressor::RandomForest(m) => m.predict(x),
            Regressor::GradientBoosting(m) => m.predict(x),
        }
    }
}

impl From<ForestRegressor> for Regressor {
    fn from(model: ForestRegressor) -> Self {
        Regressor::RandomForest(model)
    }
}

impl From<BoostedRegressor> for Regressor {
    fn from(model: BoostedRegressor) -> Self {
        Regressor::GradientBoosting(model)
    }
}

/// The selected regressor for one pollutant, bundled with the scaler it was
/// trained behind
///
/// Never mutated after training; a retrain produces a new value.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainedModel {
    pub pollutant: Pollutant,
    pub metadata: ModelMetadata,
    pub feature_names: Vec<String>,
    scaler: StandardScaler,
    regressor: Regressor,
}

impl TrainedModel {
    pub fn new(
        pollutant: Pollutant,
        metadata: ModelMetadata,
        feature_names: Vec<String>,
        scaler: StandardScaler,
        regressor: Regressor,
    ) -> Result<Self> {
        if scaler.n_features() != feature_names.len() {
            anyhow::bail!(
                "Scaler width {} does not match {} feature names",
                scaler.n_features(),
                feature_names.len()
            );
        }
        if metadata.family != regressor.family() {
            anyhow::bail!(
                "Metadata family {} does not match regressor family {}",
                metadata.family,
                regressor.family()
            );
        }
        Ok(Self {
            pollutant,
            metadata,
            feature_names,
            scaler,
            regressor,
        })
    }

    pub fn family(&self) -> ModelFamily {
        self.regressor.family()
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    /// Scale an unscaled feature row and predict one value
    pub fn predict_raw(&self, row: &[f64]) -> Result<f64> {
        let scaled = self.scaler.transform_row(row)?;
        self.regressor
            .predict(&[scaled])?
            .first()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("Model returned empty predictions"))
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<f64> {
        if features.feature_names != self.feature_names {
            anyhow::bail!("Feature layout does not match the layout {} was trained on", self.pollutant);
        }
        self.predict_raw(&features.features)
    }
}

/// Immutable map of pollutant to its trained model
///
/// May hold fewer than six entries when some pollutants could not be
/// trained.
#[derive(Debug, Default)]
pub struct TrainedModelSet {
    models: BTreeMap<Pollutant, TrainedModel>,
}

impl TrainedModelSet {
    pub fn new(models: impl IntoIterator<Item = TrainedModel>) -> Self {
        Self {
            models: models.into_iter().map(|m| (m.pollutant, m)).collect(),
        }
    }

    pub fn get(&self, pollutant: Pollutant) -> Option<&TrainedModel> {
        self.models.get(&pollutant)
    }

    pub fn pollutants(&self) -> Vec<Pollutant> {
        self.models.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrainedModel> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ml::smartcore::BoostingParams;
    use crate::ml::ValidationMetrics;

    /// A tiny boosted model over two features: y = 10 * x0
    pub(crate) fn tiny_model(pollutant: Pollutant) -> TrainedModel {
        let x: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64, 1.0]).collect();
        let y: Vec<f64> = (0..20).map(|i| 10.0 * i as f64).collect();
        let scaler = StandardScaler::fit(&x).unwrap();
        let scaled = scaler.transform(&x).unwrap();
        let params = BoostingParams {
            n_stages: 30,
            max_depth: 3,
            ..BoostingParams::default()
        };
        let regressor = BoostedRegressor::fit(&scaled, &y, &params).unwrap();
        let metadata = ModelMetadata {
            model_id: format!("test_{}", pollutant),
            family: ModelFamily::GradientBoosting,
            trained_at: chrono::Utc::now(),
            training_samples: 20,
            holdout_samples: 0,
            validation_metrics: ValidationMetrics::new(0.0, 0.0, 0.0, 1.0),
            runner_up_mae: 0.0,
        };
        TrainedModel::new(
            pollutant,
            metadata,
            vec!["x0".to_string(), "x1".to_string()],
            scaler,
            regressor.into(),
        )
        .unwrap()
    }

    #[test]
    fn test_predict_raw_scales_first() {
        let model = tiny_model(Pollutant::Pm25);
        let low = model.predict_raw(&[1.0, 1.0]).unwrap();
        let high = model.predict_raw(&[18.0, 1.0]).unwrap();
        assert!(high > low);
        assert!((high - 180.0).abs() < 30.0);
    }

    #[test]
    fn test_predict_checks_layout() {
        let model = tiny_model(Pollutant::Pm25);
        let wrong = FeatureVector::new(vec![1.0, 1.0], vec!["a".into(), "b".into()]).unwrap();
        assert!(model.predict(&wrong).is_err());

        let right = FeatureVector::new(vec![1.0, 1.0], model.feature_names.clone()).unwrap();
        assert!(model.predict(&right).is_ok());
    }

    #[test]
    fn test_mismatched_parts_rejected() {
        let model = tiny_model(Pollutant::No2);
        let TrainedModel {
            pollutant,
            mut metadata,
            feature_names,
            scaler,
            regressor,
        } = model;
        metadata.family = ModelFamily::RandomForest;
        assert!(TrainedModel::new(pollutant, metadata, feature_names, scaler, regressor).is_err());
    }

    #[test]
    fn test_model_set_partial() {
        let set = TrainedModelSet::new(vec![tiny_model(Pollutant::O3), tiny_model(Pollutant::Pm25)]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.pollutants(), vec![Pollutant::Pm25, Pollutant::O3]);
        assert!(set.get(Pollutant::Co2).is_none());
        assert!(TrainedModelSet::default().is_empty());
    }
}
