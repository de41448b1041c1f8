//! Forecasting
//!
//! - `features` builds the fixed feature layout from observations or from
//!   current conditions
//! - `engine` rolls trained models forward hour by hour

pub mod engine;
pub mod features;

pub use engine::{ForecastTrajectory, FutureConditions, OwnLagFeedback, RecursiveForecaster};
pub use features::{FeatureFrame, FeatureLayout, FeaturePipeline};
