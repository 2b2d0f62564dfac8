/// Модуль предобработки данных

pub mod feature_engineering;
pub mod normalization;
pub mod quality;
pub mod schema;
pub mod sequences;
pub mod timestamp;

pub use feature_engineering::{Dataset, FeatureAssembler};
pub use normalization::MinMaxScaler;
pub use quality::QualityFilter;
pub use schema::{Quantity, ResolvedSchema, SchemaNormalizer};
pub use sequences::{create_sequences, TrainTestSplit};
