//! Shared application state
//!
//! Wires the simulator, trainer, forecaster and model store together and
//! owns the retrain-then-swap sequence used by the HTTP layer.

use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::config::Config;
use crate::domain::{CurrentConditions, ObservationRecord, ObservationSeries};
use crate::error::AirQualityError;
use crate::forecast::{ForecastTrajectory, RecursiveForecaster};
use crate::ml::{persistence, ModelStore, ModelTrainer, TrainedModelSet, TrainingReport};
use crate::simulation::{EnvironmentConfig, EnvironmentSimulator};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub service: Arc<ForecastService>,
}

impl AppState {
    /// Load persisted models, or simulate and train a first set
    pub fn bootstrap(cfg: Config) -> Result<Self> {
        let service = ForecastService::bootstrap(cfg.clone())?;
        Ok(Self {
            cfg: Arc::new(cfg),
            service: Arc::new(service),
        })
    }

    pub fn with_models(cfg: Config, models: TrainedModelSet) -> Result<Self> {
        let service = ForecastService::new(cfg.clone(), models)?;
        Ok(Self {
            cfg: Arc::new(cfg),
            service: Arc::new(service),
        })
    }
}

/// Data a retrain runs on
#[derive(Debug, Clone)]
pub enum TrainingSource {
    Records(Vec<ObservationRecord>),
    Simulated(usize),
}

pub struct ForecastService {
    cfg: Config,
    store: ModelStore,
    trainer: ModelTrainer,
    forecaster: RecursiveForecaster,
    simulator: EnvironmentSimulator,
    // Serializes retrain + persist so artifacts on disk match one set
    retrain: Mutex<()>,
}

impl ForecastService {
    pub fn new(cfg: Config, models: TrainedModelSet) -> Result<Self> {
        let simulator = EnvironmentSimulator::new(
            EnvironmentConfig::default().with_random_seed(cfg.models.seed),
        )?;
        Ok(Self {
            store: ModelStore::new(models),
            trainer: ModelTrainer::new(cfg.training.clone()),
            forecaster: RecursiveForecaster::new(),
            simulator,
            retrain: Mutex::new(()),
            cfg,
        })
    }

    pub fn bootstrap(cfg: Config) -> Result<Self> {
        let restored = match persistence::restore(&cfg.models.dir) {
            Ok(models) => models,
            Err(e) => {
                warn!(error = %e, dir = %cfg.models.dir.display(), "could not restore models");
                TrainedModelSet::default()
            }
        };

        if !restored.is_empty() {
            info!(pollutants = restored.len(), "loaded pre-trained models");
            return Self::new(cfg, restored);
        }

        info!(samples = cfg.models.bootstrap_samples, "no pre-trained models, training new ones");
        let samples = cfg.models.bootstrap_samples;
        let service = Self::new(cfg, TrainedModelSet::default())?;
        service.retrain(TrainingSource::Simulated(samples))?;
        Ok(service)
    }

    pub fn models(&self) -> Arc<TrainedModelSet> {
        self.store.snapshot()
    }

    pub fn forecast(
        &self,
        conditions: &CurrentConditions,
        hours_ahead: usize,
    ) -> Result<ForecastTrajectory, AirQualityError> {
        let models = self.store.snapshot();
        self.forecaster.forecast(&models, conditions, hours_ahead)
    }

    /// Train a new set, persist it, then publish it
    ///
    /// A run that trains nothing leaves the current set in place.
    pub fn retrain(&self, source: TrainingSource) -> Result<TrainingReport, AirQualityError> {
        let series = match source {
            TrainingSource::Records(records) => ObservationSeries::sorted(records)?,
            TrainingSource::Simulated(0) => {
                return Err(AirQualityError::InvalidInput(
                    "n_samples must be positive".to_string(),
                ))
            }
            TrainingSource::Simulated(n) => self.simulator.generate(n),
        };

        let _guard = self.retrain.lock();
        let outcome = self.trainer.train(&series);
        if outcome.models.is_empty() {
            return Err(AirQualityError::NoModelsTrained {
                skipped: outcome.report.skipped.len(),
            });
        }

        persistence::persist(&outcome.models, &self.cfg.models.dir)?;
        self.store.replace(outcome.models);
        info!(
            rows = series.len(),
            trained = outcome.report.trained.len(),
            skipped = outcome.report.skipped.len(),
            "models retrained"
        );
        Ok(outcome.report)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::Pollutant;
    use crate::ml::training::tests::fast_config;

    pub(crate) fn test_config(dir: &std::path::Path) -> Config {
        let mut cfg = Config::default();
        cfg.training = fast_config();
        cfg.models.dir = dir.to_path_buf();
        cfg.models.bootstrap_samples = 120;
        cfg
    }

    #[test]
    fn test_bootstrap_trains_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::bootstrap(test_config(dir.path())).unwrap();

        assert_eq!(state.service.models().len(), 6);
        assert!(persistence::artifact_path(dir.path(), Pollutant::Pm25).is_file());

        // Second start restores instead of retraining
        let restored = AppState::bootstrap(test_config(dir.path())).unwrap();
        assert_eq!(
            restored.service.models().get(Pollutant::Co2).unwrap().metadata,
            state.service.models().get(Pollutant::Co2).unwrap().metadata
        );
    }

    #[test]
    fn test_failed_retrain_keeps_current_set() {
        let dir = tempfile::tempdir().unwrap();
        let service = ForecastService::bootstrap(test_config(dir.path())).unwrap();
        let before = service.models();

        // A single record leaves every pollutant with too few rows
        let record = service.simulator.generate(1).into_records();
        let result = service.retrain(TrainingSource::Records(record));
        assert!(matches!(result, Err(AirQualityError::NoModelsTrained { skipped: 6 })));
        assert!(Arc::ptr_eq(&before, &service.models()));

        assert!(matches!(
            service.retrain(TrainingSource::Simulated(0)),
            Err(AirQualityError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_retrain_swaps_set() {
        let dir = tempfile::tempdir().unwrap();
        let service = ForecastService::bootstrap(test_config(dir.path())).unwrap();
        let before = service.models();

        let report = service.retrain(TrainingSource::Simulated(96)).unwrap();
        assert_eq!(report.trained.len(), 6);
        assert!(!Arc::ptr_eq(&before, &service.models()));
        // Readers holding the old snapshot still have a whole set
        assert_eq!(before.len(), 6);
    }
}
