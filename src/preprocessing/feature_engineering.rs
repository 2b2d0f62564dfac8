//! Сборка матрицы признаков (X, y) для моделей MLD

use chrono::Datelike;
use ndarray::Array2;

use crate::config::PipelineConfig;
use crate::error::FeatureError;
use crate::models::mixed_layer::MldExtractor;
use crate::models::profiles::ensure_profile_ids;
use crate::types::{FeatureColumn, Observation};

/// Готовый датасет: X (строки × признаки) и y (строки × 1).
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    pub x: Array2<f64>,
    pub y: Array2<f64>,
}

impl Dataset {
    pub fn n_rows(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }
}

pub struct FeatureAssembler {
    features: Vec<FeatureColumn>,
    extractor: MldExtractor,
}

impl FeatureAssembler {
    pub fn new(config: &PipelineConfig) -> Self {
        // порядок колонок всегда фиксированный, независимо от порядка в настройках
        let features = FeatureColumn::ALL
            .into_iter()
            .filter(|c| config.features.contains(c))
            .collect();

        Self {
            features,
            extractor: MldExtractor::from_config(config),
        }
    }

    pub fn features(&self) -> &[FeatureColumn] {
        &self.features
    }

    /// Значение признака для одного наблюдения
    fn feature_value(column: FeatureColumn, obs: &Observation) -> Option<f64> {
        match column {
            FeatureColumn::Temperature => obs.temperature,
            FeatureColumn::Salinity => obs.salinity,
            FeatureColumn::Latitude => obs.latitude,
            FeatureColumn::Longitude => obs.longitude,
            FeatureColumn::Month => obs.date_time.map(|t| t.month() as f64),
            FeatureColumn::DayOfYear => obs.date_time.map(|t| t.ordinal() as f64),
            FeatureColumn::Depth => obs.depth,
        }
    }

    /// Наблюдения, дополненные профилями и MLD, в хронологическом порядке.
    pub fn prepare(&self, observations: &[Observation]) -> Vec<Observation> {
        let mut rows = observations.to_vec();

        if rows.iter().all(|o| o.mixed_layer_depth.is_none()) {
            ensure_profile_ids(&mut rows);
            rows = self.extractor.annotate(&rows);
        }

        // стабильная сортировка: строки без времени в конце
        rows.sort_by(|a, b| match (a.date_time, b.date_time) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        rows
    }

    pub fn assemble(&self, observations: &[Observation]) -> Result<Dataset, FeatureError> {
        if self.features.is_empty() {
            return Err(FeatureError::NoFeatures);
        }
        let feature_names: Vec<String> =
            self.features.iter().map(|c| c.name().to_string()).collect();
        tracing::info!("Using features: {:?}", feature_names);

        let rows = self.prepare(observations);

        let n_features = self.features.len();
        let mut x_data = Vec::with_capacity(rows.len() * n_features);
        let mut y_data = Vec::with_capacity(rows.len());

        for obs in &rows {
            let values: Option<Vec<f64>> = self
                .features
                .iter()
                .map(|&c| Self::feature_value(c, obs))
                .collect();

            if let (Some(values), Some(target)) = (values, obs.mixed_layer_depth) {
                x_data.extend(values);
                y_data.push(target);
            }
        }

        let n_rows = y_data.len();
        let dropped = rows.len() - n_rows;
        if dropped > 0 {
            tracing::info!("Dropped {} rows with missing values", dropped);
        }

        let x = Array2::from_shape_vec((n_rows, n_features), x_data)
            .map_err(|e| FeatureError::ShapeMismatch(e.to_string()))?;
        let y = Array2::from_shape_vec((n_rows, 1), y_data)
            .map_err(|e| FeatureError::ShapeMismatch(e.to_string()))?;

        tracing::info!("Final dataset: X={:?}, y={:?}", x.dim(), y.dim());
        Ok(Dataset { feature_names, x, y })
    }
}

impl Default for FeatureAssembler {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}
