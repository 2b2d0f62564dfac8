//! Полный путь: сырая таблица -> схема -> QC -> профили -> MLD -> (X, y)

use ndarray::{Array2, Array3};

use crate::config::PipelineConfig;
use crate::error::{FeatureError, Result, SchemaError};
use crate::models::{MldExtractor, ProfileGrouper};
use crate::preprocessing::{
    create_sequences, Dataset, FeatureAssembler, MinMaxScaler, QualityFilter, ResolvedSchema,
    SchemaNormalizer,
};
use crate::types::{Observation, ProfileSummary, RawTable};

/// Окна для последовательной модели и (если было) масштабирование.
#[derive(Debug, Clone)]
pub struct SequenceSet {
    pub feature_names: Vec<String>,
    pub x: Array3<f64>,
    pub y: Array2<f64>,
    pub scaler_x: Option<MinMaxScaler>,
    pub scaler_y: Option<MinMaxScaler>,
}

pub struct MldPipeline {
    quality: QualityFilter,
    extractor: MldExtractor,
    assembler: FeatureAssembler,
}

impl MldPipeline {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            quality: QualityFilter::from_config(config),
            extractor: MldExtractor::from_config(config),
            assembler: FeatureAssembler::new(config),
        }
    }

    /// Схема, QC и канонические наблюдения.
    pub fn normalize(&self, table: &RawTable) -> Result<Vec<Observation>, SchemaError> {
        tracing::debug!("Raw columns: {:?}", table.column_names().collect::<Vec<_>>());

        let schema = ResolvedSchema::resolve(table)?;
        let filtered = self.quality.apply(table, &schema);
        Ok(SchemaNormalizer::normalize(&filtered, &schema))
    }

    pub fn prepare_features(&self, table: &RawTable) -> Result<Dataset> {
        tracing::info!("Preparing features from {} raw rows", table.n_rows());
        let observations = self.normalize(table)?;
        Ok(self.assembler.assemble(&observations)?)
    }

    /// Одна сводка на профиль, в порядке `profile_id`.
    pub fn profile_summaries(&self, table: &RawTable) -> Result<Vec<ProfileSummary>> {
        let observations = self.normalize(table)?;

        let summaries = ProfileGrouper::group(&observations)
            .map(|profile| {
                let depths: Vec<f64> = profile.observations().filter_map(|o| o.depth).collect();
                let first = profile.observations().next();
                let presupplied = profile.observations().find_map(|o| o.mixed_layer_depth);

                ProfileSummary {
                    profile_id: profile.id.clone(),
                    n_observations: profile.len(),
                    min_depth: depths.iter().copied().reduce(f64::min),
                    max_depth: depths.iter().copied().reduce(f64::max),
                    mixed_layer_depth: presupplied.or_else(|| self.extractor.profile_mld(&profile)),
                    latitude: first.and_then(|o| o.latitude),
                    longitude: first.and_then(|o| o.longitude),
                    date_time: first.and_then(|o| o.date_time),
                }
            })
            .collect();

        Ok(summaries)
    }

    /// (X, y) -> окна длины `time_steps`, при `scale` в [0, 1] по каждой колонке.
    pub fn prepare_sequences(
        &self,
        table: &RawTable,
        time_steps: usize,
        scale: bool,
    ) -> Result<SequenceSet> {
        let dataset = self.prepare_features(table)?;
        if scale && dataset.n_rows() == 0 {
            return Err(FeatureError::EmptyDataset.into());
        }

        let (x, y, scaler_x, scaler_y) = if scale {
            let mut scaler_x = MinMaxScaler::new();
            let mut scaler_y = MinMaxScaler::new();
            let x = scaler_x.fit_transform(&dataset.x)?;
            let y = scaler_y.fit_transform(&dataset.y)?;
            (x, y, Some(scaler_x), Some(scaler_y))
        } else {
            (dataset.x, dataset.y, None, None)
        };

        let (x, y) = create_sequences(&x, &y, time_steps)?;
        Ok(SequenceSet {
            feature_names: dataset.feature_names,
            x,
            y,
            scaler_x,
            scaler_y,
        })
    }
}

impl Default for MldPipeline {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::types::{ProfileId, Value};

    fn cast(platform: &str, cycle: i64, juld: f64, depths: &[f64], temps: &[f64]) -> Vec<(String, Vec<Value>)> {
        let n = depths.len();
        vec![
            ("platform_number".into(), vec![Value::from(platform); n]),
            ("cycle_number".into(), vec![Value::Int(cycle); n]),
            ("juld".into(), vec![Value::from(juld); n]),
            ("latitude".into(), vec![Value::from(-10.0); n]),
            ("longitude".into(), vec![Value::from(70.0); n]),
            ("pres_adjusted".into(), depths.iter().copied().map(Value::from).collect()),
            ("temp_adjusted".into(), temps.iter().copied().map(Value::from).collect()),
            ("psal_adjusted".into(), vec![Value::from(35.0); n]),
        ]
    }

    fn concat(parts: Vec<Vec<(String, Vec<Value>)>>) -> RawTable {
        let mut columns: Vec<(String, Vec<Value>)> = Vec::new();
        for part in parts {
            for (name, values) in part {
                if let Some(pos) = columns.iter().position(|(n, _)| *n == name) {
                    columns[pos].1.extend(values);
                } else {
                    columns.push((name, values));
                }
            }
        }
        RawTable::from_columns(columns).unwrap()
    }

    #[test]
    fn summaries_report_one_mld_per_profile() {
        let table = concat(vec![
            cast("1901605", 1, 25567.0, &[5.0, 10.0, 20.0], &[20.0, 20.0, 18.0]),
            cast("1901605", 2, 25577.0, &[5.0, 10.0, 20.0], &[20.0, 19.8, 19.7]),
        ]);

        let summaries = MldPipeline::default().profile_summaries(&table).unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].profile_id, ProfileId::Index(0));
        assert_eq!(summaries[0].n_observations, 3);
        assert_eq!(summaries[0].min_depth, Some(5.0));
        assert_eq!(summaries[0].max_depth, Some(20.0));
        assert_eq!(summaries[0].mixed_layer_depth, Some(20.0));
        assert_eq!(summaries[1].mixed_layer_depth, Some(20.0));
    }

    #[test]
    fn sequences_are_scaled() {
        let depths: Vec<f64> = (1..=12).map(|d| d as f64 * 5.0).collect();
        let temps: Vec<f64> = depths.iter().map(|d| 25.0 - d * 0.1).collect();
        let table = concat(vec![cast("1", 1, 25567.0, &depths, &temps)]);

        let set = MldPipeline::default().prepare_sequences(&table, 4, true).unwrap();
        assert_eq!(set.x.dim(), (8, 4, 7));
        assert!(set.x.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(set.scaler_x.is_some());
    }

    #[test]
    fn scaling_an_empty_dataset_fails() {
        let table = concat(vec![cast("1", 1, f64::NAN, &[5.0], &[20.0])]);
        let err = MldPipeline::default().prepare_sequences(&table, 2, true).unwrap_err();
        assert_eq!(err, PipelineError::Feature(FeatureError::EmptyDataset));
    }
}
