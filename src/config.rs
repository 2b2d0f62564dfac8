//! Настройки пайплайна и сервера

use std::net::SocketAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::FeatureColumn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Порог отклонения температуры от опорной, °C
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Опорная глубина, м
    #[serde(default = "default_reference_depth")]
    pub reference_depth: f64,
    #[serde(default = "default_accepted_qc_flags")]
    pub accepted_qc_flags: Vec<String>,
    #[serde(default = "default_features")]
    pub features: Vec<FeatureColumn>,
}

fn default_threshold() -> f64 { 0.5 }
fn default_reference_depth() -> f64 { 10.0 }
fn default_accepted_qc_flags() -> Vec<String> { vec!["1".to_string(), "2".to_string()] }
fn default_features() -> Vec<FeatureColumn> { FeatureColumn::ALL.to_vec() }

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            reference_depth: default_reference_depth(),
            accepted_qc_flags: default_accepted_qc_flags(),
            features: default_features(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Настройки по умолчанию для запросов без собственного `config`
    pub pipeline: PipelineConfig,
}

impl ServerConfig {
    pub const ADDR_ENV: &'static str = "ARGO_MLD_ADDR";
    pub const THRESHOLD_ENV: &'static str = "ARGO_MLD_THRESHOLD";
    pub const REFERENCE_DEPTH_ENV: &'static str = "ARGO_MLD_REFERENCE_DEPTH";

    pub fn from_env() -> Self {
        let addr = env_parse(Self::ADDR_ENV).unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8000)));

        let mut pipeline = PipelineConfig::default();
        if let Some(threshold) = env_parse(Self::THRESHOLD_ENV) {
            pipeline.threshold = threshold;
        }
        if let Some(depth) = env_parse(Self::REFERENCE_DEPTH_ENV) {
            pipeline.reference_depth = depth;
        }

        Self { addr, pipeline }
    }
}

fn env_parse<T>(key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(key).ok()?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Ignoring {}={}: {}", key, raw, e);
            None
        }
    }
}
