//! Ошибки пайплайна

use thiserror::Error;

/// Структурные проблемы входной таблицы. Всегда фатальны.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("Argo variables missing: {}", .0.join(", "))]
    MissingQuantities(Vec<String>),

    #[error("latitude/longitude columns required, missing: {}", .0.join(", "))]
    MissingPosition(Vec<String>),

    #[error("Column '{column}' has {found} rows, expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error("No valid feature columns found after normalization")]
    NoFeatures,

    #[error("Feature matrix shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Sequence length must be positive")]
    ZeroTimeSteps,

    #[error("Scaler not fitted")]
    ScalerNotFitted,

    #[error("Scaler fitted on {fitted} columns, got {got}")]
    ScalerWidthMismatch { fitted: usize, got: usize },

    #[error("Empty dataset")]
    EmptyDataset,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Feature(#[from] FeatureError),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
