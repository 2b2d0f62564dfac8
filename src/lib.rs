//! Argo MLD - подготовка признаков глубины перемешанного слоя

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod types;

pub use config::{PipelineConfig, ServerConfig};
pub use error::{FeatureError, PipelineError, SchemaError};
pub use models::*;
pub use pipeline::{MldPipeline, SequenceSet};
pub use preprocessing::*;
pub use types::*;
