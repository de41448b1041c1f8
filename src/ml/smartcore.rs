//! SmartCore-backed regressors
//!
//! Two ensemble families compete for every pollutant:
//! - `ForestRegressor` wraps SmartCore's bagged `RandomForestRegressor`
//! - `BoostedRegressor` stages depth-limited SmartCore regression trees on
//!   squared-error residuals

use anyhow::Result;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};

use super::models::RegressionModel;
use super::ModelFamily;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;
type Tree = DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Row-major rows into a SmartCore matrix
fn to_matrix(x: &[Vec<f64>]) -> Result<DenseMatrix<f64>> {
    let Some(first) = x.first() else {
        anyhow::bail!("Cannot build a matrix from an empty dataset");
    };
    let n_samples = x.len();
    let n_features = first.len();

    let mut flat_data = Vec::with_capacity(n_samples * n_features);
    for row in x {
        if row.len() != n_features {
            anyhow::bail!("All feature vectors must have the same length");
        }
        flat_data.extend_from_slice(row);
    }

    Ok(DenseMatrix::new(n_samples, n_features, flat_data, false))
}

fn check_training_data(x: &[Vec<f64>], y: &[f64]) -> Result<()> {
    if x.is_empty() || y.is_empty() {
        anyhow::bail!("Cannot train on empty dataset");
    }
    if x.len() != y.len() {
        anyhow::bail!(
            "Feature and target count mismatch: {} features, {} targets",
            x.len(),
            y.len()
        );
    }
    Ok(())
}

/// Random forest settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_samples_leaf: usize,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 15,
            min_samples_leaf: 1,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

impl ForestParams {
    fn to_smartcore(&self) -> RandomForestRegressorParameters {
        RandomForestRegressorParameters {
            max_depth: Some(self.max_depth),
            min_samples_leaf: self.min_samples_leaf,
            min_samples_split: self.min_samples_split,
            n_trees: self.n_trees,
            m: None, // SmartCore picks the per-split feature subset size
            keep_samples: false,
            seed: self.seed,
        }
    }
}

/// Bagged ensemble of randomized, depth-limited regression trees
#[derive(Debug, Serialize, Deserialize)]
pub struct ForestRegressor {
    pub params: ForestParams,
    model: Forest,
}

impl RegressionModel for ForestRegressor {
    type Params = ForestParams;
    const FAMILY: ModelFamily = ModelFamily::RandomForest;

    fn fit(x: &[Vec<f64>], y: &[f64], params: &ForestParams) -> Result<Self> {
        check_training_data(x, y)?;
        let matrix = to_matrix(x)?;
        let model = Forest::fit(&matrix, &y.to_vec(), params.to_smartcore())
            .map_err(|e| anyhow::anyhow!("RandomForest training failed: {:?}", e))?;
        Ok(Self {
            params: params.clone(),
            model,
        })
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        let matrix = to_matrix(x)?;
        self.model
            .predict(&matrix)
            .map_err(|e| anyhow::anyhow!("RandomForest prediction failed: {:?}", e))
    }
}

/// Gradient boosting settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub n_stages: usize,
    pub max_depth: u16,
    pub learning_rate: f64,
    pub min_samples_leaf: usize,
    pub min_samples_split: usize,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_stages: 100,
            max_depth: 6,
            learning_rate: 0.1,
            min_samples_leaf: 1,
            min_samples_split: 2,
        }
    }
}

impl BoostingParams {
    fn tree_parameters(&self) -> DecisionTreeRegressorParameters {
        DecisionTreeRegressorParameters::default()
            .with_max_depth(self.max_depth)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_min_samples_split(self.min_samples_split)
    }
}

/// Staged additive ensemble of regression trees
///
/// Starts from the training mean; every stage fits a tree to the current
/// residuals and adds it scaled by the learning rate.
#[derive(Debug, Serialize, Deserialize)]
pub struct BoostedRegressor {
    pub params: BoostingParams,
    init: f64,
    stages: Vec<Tree>,
}

impl BoostedRegressor {
    pub fn n_stages(&self) -> usize {
        self.stages.len()
    }
}

impl RegressionModel for BoostedRegressor {
    type Params = BoostingParams;
    const FAMILY: ModelFamily = ModelFamily::GradientBoosting;

    fn fit(x: &[Vec<f64>], y: &[f64], params: &BoostingParams) -> Result<Self> {
        check_training_data(x, y)?;
        if !(params.learning_rate > 0.0 && params.learning_rate <= 1.0) {
            anyhow::bail!("Learning rate must be in (0, 1]");
        }

        let matrix = to_matrix(x)?;
        let init = y.iter().sum::<f64>() / y.len() as f64;
        let mut fitted = vec![init; y.len()];
        let mut stages = Vec::with_capacity(params.n_stages);

        for stage in 0..params.n_stages {
            let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(t, f)| t - f).collect();
            let tree = Tree::fit(&matrix, &residuals, params.tree_parameters()).map_err(|e| {
                anyhow::anyhow!("GradientBoosting stage {} failed: {:?}", stage, e)
            })?;
            let update = tree
                .predict(&matrix)
                .map_err(|e| anyhow::anyhow!("GradientBoosting stage {} failed: {:?}", stage, e))?;
            for (f, u) in fitted.iter_mut().zip(update) {
                *f += params.learning_rate * u;
            }
            stages.push(tree);
        }

        Ok(Self {
            params: params.clone(),
            init,
            stages,
        })
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        let matrix = to_matrix(x)?;
        let mut predictions = vec![self.init; x.len()];
        for tree in &self.stages {
            let update = tree
                .predict(&matrix)
                .map_err(|e| anyhow::anyhow!("GradientBoosting prediction failed: {:?}", e))?;
            for (p, u) in predictions.iter_mut().zip(update) {
                *p += self.params.learning_rate * u;
            }
        }
        Ok(predictions)
    }
}
