use std::path::PathBuf;

use thiserror::Error;

use crate::domain::Pollutant;

/// Errors surfaced by the forecasting core
#[derive(Debug, Error)]
pub enum AirQualityError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Observation series is not strictly ordered at index {index}")]
    UnorderedSeries { index: usize },

    #[error("Not enough usable rows to train {pollutant}: {rows}")]
    EmptyTrainingSet { pollutant: Pollutant, rows: usize },

    #[error("Training produced no models; {skipped} pollutants skipped")]
    NoModelsTrained { skipped: usize },

    #[error("Model artifact I/O failed for {}: {source}", .path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Model artifact encoding failed: {0}")]
    Encoding(#[from] bincode::Error),

    #[error(transparent)]
    Model(#[from] anyhow::Error),
}

pub type Result<T, E = AirQualityError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = AirQualityError::EmptyTrainingSet {
            pollutant: Pollutant::So2,
            rows: 1,
        };
        assert_eq!(error.to_string(), "Not enough usable rows to train so2: 1");

        let error = AirQualityError::NoModelsTrained { skipped: 6 };
        assert_eq!(error.to_string(), "Training produced no models; 6 pollutants skipped");
    }

    #[test]
    fn test_anyhow_is_transparent() {
        let error: AirQualityError = anyhow::anyhow!("fit failed").into();
        assert_eq!(error.to_string(), "fit failed");
    }
}
