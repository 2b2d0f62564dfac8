//! Фильтрация по QC-флагам

use crate::config::PipelineConfig;
use crate::preprocessing::schema::ResolvedSchema;
use crate::types::RawTable;

/// Оставляет только строки с допустимыми QC-флагами.
///
/// Для каждой выбранной колонки (pres/temp/psal) проверяется `<колонка>_qc`,
/// если она есть. Флаги сравниваются как текст, так что `1`, `1.0` и `"1"`
/// эквивалентны. Итоговая маска это AND по всем трём величинам.
#[derive(Debug, Clone)]
pub struct QualityFilter {
    accepted: Vec<String>,
}

impl QualityFilter {
    pub fn new<S: Into<String>>(accepted: impl IntoIterator<Item = S>) -> Self {
        Self {
            accepted: accepted.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.accepted_qc_flags.iter().cloned())
    }

    pub fn mask(&self, table: &RawTable, schema: &ResolvedSchema) -> Vec<bool> {
        let mut mask = vec![true; table.n_rows()];

        for qc_column in schema.qc_columns() {
            let Some(flags) = table.column(&qc_column) else {
                continue;
            };
            for (keep, flag) in mask.iter_mut().zip(flags) {
                *keep = *keep
                    && flag
                        .as_text()
                        .map_or(false, |f| self.accepted.iter().any(|a| *a == f));
            }
        }

        mask
    }

    /// Новая таблица без строк, не прошедших QC. Исходная не меняется.
    pub fn apply(&self, table: &RawTable, schema: &ResolvedSchema) -> RawTable {
        let mask = self.mask(table, schema);
        let filtered = table.filter_rows(&mask);

        let removed = table.n_rows() - filtered.n_rows();
        if removed > 0 {
            tracing::info!("QC filter removed {} of {} rows", removed, table.n_rows());
        }
        filtered
    }
}

impl Default for QualityFilter {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}
