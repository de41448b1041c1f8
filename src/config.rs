use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::ml::TrainingConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub models: ModelsConfig,
    pub training: TrainingConfig,
    pub forecast: ForecastConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5002,
            enable_cors: true,
            request_timeout_secs: 600,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

/// Where artifacts live and how the first model set is produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub dir: PathBuf,
    /// Simulated hours used when no artifacts exist or a retrain names no data
    pub bootstrap_samples: usize,
    /// Upper bound on rows accepted by a single retrain
    pub max_samples: usize,
    pub seed: u64,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("models"),
            bootstrap_samples: 8760,
            max_samples: 5 * 8760,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub default_hours: usize,
    pub max_hours: usize,
    /// Hours covered by the hourly AQI listing
    pub hourly_aqi_hours: usize,
    pub summary_days: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            default_hours: 24,
            max_hours: 168,
            hourly_aqi_hours: 24,
            summary_days: 3,
        }
    }
}

impl Config {
    /// Defaults, then `config/default.toml`, then `AQF__` variables, then `PORT`
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("AQF__").split("__"))
            .merge(Env::raw().only(&["PORT"]).map(|_| "server.port".into()))
    }

    pub fn load() -> Result<Self> {
        Ok(Self::figment().extract()?)
    }
}
