//! Model artifact persistence
//!
//! One bincode artifact per pollutant, named `{pollutant}_model.bin`. Each
//! artifact carries the regressor together with its scaler and feature
//! layout so a restored model predicts exactly like the one that was saved.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{TrainedModel, TrainedModelSet};
use crate::domain::Pollutant;
use crate::error::{AirQualityError, Result};

const ARTIFACT_SUFFIX: &str = "_model.bin";

pub fn artifact_path(dir: &Path, pollutant: Pollutant) -> PathBuf {
    dir.join(format!("{}{}", pollutant, ARTIFACT_SUFFIX))
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> AirQualityError + '_ {
    move |source| AirQualityError::Artifact {
        path: path.to_path_buf(),
        source,
    }
}

/// Write every model in the set, replacing what the directory held before
///
/// Artifacts for pollutants absent from the set are removed so a later
/// restore yields the same set.
pub fn persist(models: &TrainedModelSet, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(io_error(dir))?;

    let mut written = Vec::with_capacity(models.len());
    for model in models.iter() {
        let path = artifact_path(dir, model.pollutant);
        let tmp = dir.join(format!(".{}{}.tmp", model.pollutant, ARTIFACT_SUFFIX));
        let bytes = bincode::serialize(model)?;
        fs::write(&tmp, bytes).map_err(io_error(&tmp))?;
        fs::rename(&tmp, &path).map_err(io_error(&path))?;
        debug!(pollutant = %model.pollutant, path = %path.display(), "wrote model artifact");
        written.push(path);
    }

    for pollutant in Pollutant::all() {
        let path = artifact_path(dir, pollutant);
        if models.get(pollutant).is_none() && path.exists() {
            fs::remove_file(&path).map_err(io_error(&path))?;
        }
    }

    info!(dir = %dir.display(), models = written.len(), "persisted model set");
    Ok(written)
}

/// Load whatever artifacts exist; a missing directory is an empty set
pub fn restore(dir: &Path) -> Result<TrainedModelSet> {
    let mut models = Vec::new();
    for pollutant in Pollutant::all() {
        let path = artifact_path(dir, pollutant);
        if !path.is_file() {
            continue;
        }
        let bytes = fs::read(&path).map_err(io_error(&path))?;
        let model: TrainedModel = bincode::deserialize(&bytes)?;
        if model.pollutant != pollutant {
            return Err(AirQualityError::InvalidInput(format!(
                "{} holds a model for {}",
                path.display(),
                model.pollutant
            )));
        }
        models.push(model);
    }

    info!(dir = %dir.display(), models = models.len(), "restored model set");
    Ok(TrainedModelSet::new(models))
}
