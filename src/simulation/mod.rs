//! # Environment Simulation Module
//!
//! Synthetic data used to bootstrap model training when no sensor history
//! is available.
//!
//! ## Usage
//!
//! ```rust
//! use air_quality_forecaster::simulation::{EnvironmentConfig, EnvironmentSimulator};
//!
//! let simulator = EnvironmentSimulator::new(EnvironmentConfig::default().with_random_seed(42))
//!     .expect("valid noise model");
//!
//! // One week of hourly observations
//! let series = simulator.generate(24 * 7);
//! assert_eq!(series.len(), 168);
//! ```

pub mod environment;

pub use environment::{EnvironmentConfig, EnvironmentSimulator};
