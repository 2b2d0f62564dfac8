//! Типы данных для пайплайна MLD

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::SchemaError;

/// Значение одной ячейки сырой таблицы.
///
/// Источники (Parquet из NetCDF, CSV, JSON) кодируют одни и те же поля
/// по-разному: QC-флаги бывают и числами, и строками, JULD бывает
/// числом дней, строкой или уже готовым временем.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    // Из JSON сюда не попасть: строки забирает Text
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Числовое приведение. Всё, что не число (и NaN/inf), становится `None`.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            Value::Text(s) => s.trim().parse::<f64>().ok()?,
            Value::Null | Value::Bool(_) | Value::Timestamp(_) => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Текстовое представление для сравнения QC-флагов.
    /// Целые значения с плавающей точкой печатаются без дробной части: `1.0` -> `"1"`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
                    Some((*f as i64).to_string())
                } else if f.is_nan() {
                    None
                } else {
                    Some(f.to_string())
                }
            }
            Value::Text(s) => Some(s.clone()),
            Value::Timestamp(t) => Some(t.to_rfc3339()),
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Сырая таблица с произвольным набором колонок.
///
/// По JSON передаётся как список записей `[{column: value, ...}]`;
/// отсутствующий в записи ключ равен `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<BTreeMap<String, Value>>", into = "Vec<BTreeMap<String, Value>>")]
pub struct RawTable {
    columns: BTreeMap<String, Vec<Value>>,
    n_rows: usize,
}

impl RawTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Сборка из колонок. Все колонки обязаны иметь одинаковую длину.
    pub fn from_columns<S, I>(columns: I) -> Result<Self, SchemaError>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Vec<Value>)>,
    {
        let mut table = Self::new();
        for (name, values) in columns {
            table.insert_column(name, values)?;
        }
        Ok(table)
    }

    pub fn from_records(records: Vec<BTreeMap<String, Value>>) -> Self {
        let names: BTreeSet<&String> = records.iter().flat_map(|r| r.keys()).collect();

        let columns = names
            .into_iter()
            .map(|name| {
                let values = records
                    .iter()
                    .map(|r| r.get(name).cloned().unwrap_or(Value::Null))
                    .collect();
                (name.clone(), values)
            })
            .collect();

        Self {
            columns,
            n_rows: records.len(),
        }
    }

    pub fn insert_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<Value>,
    ) -> Result<(), SchemaError> {
        let name = name.into();
        if self.columns.is_empty() {
            self.n_rows = values.len();
        } else if values.len() != self.n_rows {
            return Err(SchemaError::RaggedColumn {
                column: name,
                expected: self.n_rows,
                found: values.len(),
            });
        }
        self.columns.insert(name, values);
        Ok(())
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Новая таблица только со строками, где `mask[i] == true`.
    pub fn filter_rows(&self, mask: &[bool]) -> RawTable {
        let columns = self
            .columns
            .iter()
            .map(|(name, values)| {
                let kept = values
                    .iter()
                    .zip(mask)
                    .filter(|(_, keep)| **keep)
                    .map(|(v, _)| v.clone())
                    .collect();
                (name.clone(), kept)
            })
            .collect();

        RawTable {
            columns,
            n_rows: mask.iter().take(self.n_rows).filter(|k| **k).count(),
        }
    }
}

impl From<Vec<BTreeMap<String, Value>>> for RawTable {
    fn from(records: Vec<BTreeMap<String, Value>>) -> Self {
        Self::from_records(records)
    }
}

impl From<RawTable> for Vec<BTreeMap<String, Value>> {
    fn from(table: RawTable) -> Self {
        (0..table.n_rows)
            .map(|i| {
                table
                    .columns
                    .iter()
                    .map(|(name, values)| (name.clone(), values[i].clone()))
                    .collect()
            })
            .collect()
    }
}

/// Идентификатор профиля (одного вертикального зондирования).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileId {
    Index(u64),
    Label(String),
}

impl ProfileId {
    /// Идентификатор из готовой колонки `profile_id`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Int(i) if *i >= 0 => Some(ProfileId::Index(*i as u64)),
            Value::Float(f) if f.is_finite() && f.fract() == 0.0 && *f >= 0.0 => {
                Some(ProfileId::Index(*f as u64))
            }
            other => other.as_text().map(ProfileId::Label),
        }
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileId::Index(i) => write!(f, "{}", i),
            ProfileId::Label(s) => f.write_str(s),
        }
    }
}

/// Одно измерение на одной глубине в каноническом виде.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub depth: Option<f64>,       // м (дбар ~ м)
    pub temperature: Option<f64>, // °C
    pub salinity: Option<f64>,    // PSU
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub date_time: Option<DateTime<Utc>>,
    pub profile_id: Option<ProfileId>,
    #[serde(default)]
    pub mixed_layer_depth: Option<f64>,
}

/// Колонки признаков в фиксированном порядке предпочтения.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureColumn {
    Temperature,
    Salinity,
    Latitude,
    Longitude,
    Month,
    DayOfYear,
    Depth,
}

impl FeatureColumn {
    pub const ALL: [FeatureColumn; 7] = [
        FeatureColumn::Temperature,
        FeatureColumn::Salinity,
        FeatureColumn::Latitude,
        FeatureColumn::Longitude,
        FeatureColumn::Month,
        FeatureColumn::DayOfYear,
        FeatureColumn::Depth,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FeatureColumn::Temperature => "temperature",
            FeatureColumn::Salinity => "salinity",
            FeatureColumn::Latitude => "latitude",
            FeatureColumn::Longitude => "longitude",
            FeatureColumn::Month => "month",
            FeatureColumn::DayOfYear => "day_of_year",
            FeatureColumn::Depth => "depth",
        }
    }
}

/// Сводка по одному профилю.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub profile_id: ProfileId,
    pub n_observations: usize,
    pub min_depth: Option<f64>,
    pub max_depth: Option<f64>,
    pub mixed_layer_depth: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub date_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRequest {
    pub records: RawTable,
    #[serde(default)]
    pub config: Option<PipelineConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceRequest {
    pub records: RawTable,
    #[serde(default)]
    pub config: Option<PipelineConfig>,
    #[serde(default = "default_time_steps")]
    pub time_steps: usize,
    #[serde(default = "default_scale")]
    pub scale: bool,
}

fn default_time_steps() -> usize { 30 }
fn default_scale() -> bool { true }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesOutput {
    pub feature_names: Vec<String>,
    pub x: Vec<Vec<f64>>,
    pub y: Vec<f64>,
    pub n_rows: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilesOutput {
    pub profiles: Vec<ProfileSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequencesOutput {
    pub feature_names: Vec<String>,
    pub time_steps: usize,
    pub x: Vec<Vec<Vec<f64>>>, // окна × шаги × признаки
    pub y: Vec<f64>,
    pub n_windows: usize,
    /// [min, max] MLD до масштабирования, если y масштабирован
    pub target_range: Option<[f64; 2]>,
}
