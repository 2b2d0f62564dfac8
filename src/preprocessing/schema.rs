//! Приведение схемы Argo к каноническим колонкам
//!
//! pres/temp/psal (с вариантами `*_adjusted`) -> depth/temperature/salinity,
//! JULD -> `date_time` в UTC, (платформа, цикл) или (широта, долгота, время) -> `profile_id`.

use chrono::{DateTime, Utc};

use crate::error::SchemaError;
use crate::models::profiles::{assign_by_platform_cycle, assign_by_position, fill_missing_by_position};
use crate::preprocessing::timestamp::{decode_juld, normalize_date_time};
use crate::types::{Observation, ProfileId, RawTable, Value};

pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const DATE_TIME: &str = "date_time";
pub const JULD: &str = "juld";
pub const PROFILE_ID: &str = "profile_id";
pub const PLATFORM_NUMBER: &str = "platform_number";
pub const CYCLE_NUMBER: &str = "cycle_number";
pub const MIXED_LAYER_DEPTH: &str = "mixed_layer_depth";

/// Физические величины, для которых выбирается колонка-источник
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Pressure,
    Temperature,
    Salinity,
}

impl Quantity {
    pub const ALL: [Quantity; 3] = [Quantity::Pressure, Quantity::Temperature, Quantity::Salinity];

    /// Варианты имени колонки в порядке предпочтения
    pub fn variants(&self) -> [&'static str; 2] {
        match self {
            Quantity::Pressure => ["pres_adjusted", "pres"],
            Quantity::Temperature => ["temp_adjusted", "temp"],
            Quantity::Salinity => ["psal_adjusted", "psal"],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Quantity::Pressure => "pres/pres_adjusted",
            Quantity::Temperature => "temp/temp_adjusted",
            Quantity::Salinity => "psal/psal_adjusted",
        }
    }

    fn resolve(&self, table: &RawTable) -> Option<&'static str> {
        self.variants().into_iter().find(|c| table.has_column(c))
    }
}

/// Какие колонки таблицы выбраны для каждой величины
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSchema {
    pub pressure: &'static str,
    pub temperature: &'static str,
    pub salinity: &'static str,
}

impl ResolvedSchema {
    pub fn resolve(table: &RawTable) -> Result<Self, SchemaError> {
        let resolved = Quantity::ALL.map(|q| q.resolve(table));

        let missing: Vec<String> = Quantity::ALL
            .iter()
            .zip(&resolved)
            .filter(|(_, col)| col.is_none())
            .map(|(q, _)| q.label().to_string())
            .collect();

        let [Some(pressure), Some(temperature), Some(salinity)] = resolved else {
            return Err(SchemaError::MissingQuantities(missing));
        };

        let missing_position: Vec<String> = [LATITUDE, LONGITUDE]
            .into_iter()
            .filter(|c| !table.has_column(c))
            .map(str::to_string)
            .collect();
        if !missing_position.is_empty() {
            return Err(SchemaError::MissingPosition(missing_position));
        }

        Ok(Self {
            pressure,
            temperature,
            salinity,
        })
    }

    pub fn columns(&self) -> [&'static str; 3] {
        [self.pressure, self.temperature, self.salinity]
    }

    /// Сопутствующие QC-колонки: `<колонка>_qc`
    pub fn qc_columns(&self) -> [String; 3] {
        self.columns().map(|c| format!("{}_qc", c))
    }
}

pub struct SchemaNormalizer;

impl SchemaNormalizer {
    /// Строит канонические наблюдения. Таблица должна быть уже отфильтрована по QC.
    pub fn normalize(table: &RawTable, schema: &ResolvedSchema) -> Vec<Observation> {
        let depth = numeric_column(table, schema.pressure);
        let temperature = numeric_column(table, schema.temperature);
        let salinity = numeric_column(table, schema.salinity);
        let latitude = numeric_column(table, LATITUDE);
        let longitude = numeric_column(table, LONGITUDE);
        let date_time = Self::derive_date_time(table);
        let profile_id = Self::derive_profile_id(table, &latitude, &longitude, &date_time);
        let mixed_layer_depth = numeric_column(table, MIXED_LAYER_DEPTH);

        let observations: Vec<Observation> = (0..table.n_rows())
            .map(|i| Observation {
                depth: depth[i],
                temperature: temperature[i],
                salinity: salinity[i],
                latitude: latitude[i],
                longitude: longitude[i],
                date_time: date_time[i],
                profile_id: profile_id[i].clone(),
                mixed_layer_depth: mixed_layer_depth[i],
            })
            .collect();

        tracing::info!(
            "Normalized {} rows using {}/{}/{}",
            observations.len(),
            schema.pressure,
            schema.temperature,
            schema.salinity
        );
        observations
    }

    fn derive_date_time(table: &RawTable) -> Vec<Option<DateTime<Utc>>> {
        if let Some(values) = table.column(DATE_TIME) {
            normalize_date_time(values)
        } else if let Some(values) = table.column(JULD) {
            decode_juld(values)
        } else {
            tracing::warn!("No date_time or juld column; timestamps are missing");
            vec![None; table.n_rows()]
        }
    }

    fn derive_profile_id(
        table: &RawTable,
        latitude: &[Option<f64>],
        longitude: &[Option<f64>],
        date_time: &[Option<DateTime<Utc>>],
    ) -> Vec<Option<ProfileId>> {
        if let Some(values) = table.column(PROFILE_ID) {
            return values.iter().map(ProfileId::from_value).collect();
        }

        match (table.column(PLATFORM_NUMBER), table.column(CYCLE_NUMBER)) {
            (Some(platform), Some(cycle)) => {
                let mut ids = assign_by_platform_cycle(platform, cycle);
                fill_missing_by_position(&mut ids, latitude, longitude, date_time);
                ids
            }
            _ => assign_by_position(latitude, longitude, date_time),
        }
    }
}

fn numeric_column(table: &RawTable, name: &str) -> Vec<Option<f64>> {
    match table.column(name) {
        Some(values) => values.iter().map(Value::as_number).collect(),
        None => vec![None; table.n_rows()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn floats(values: &[f64]) -> Vec<Value> {
        values.iter().copied().map(Value::from).collect()
    }

    fn base_table() -> RawTable {
        RawTable::from_columns([
            ("pres", floats(&[5.0, 10.0])),
            ("temp", floats(&[20.0, 19.0])),
            ("psal", floats(&[35.0, 35.1])),
            ("latitude", floats(&[10.0, 10.0])),
            ("longitude", floats(&[60.0, 60.0])),
        ])
        .unwrap()
    }

    #[test]
    fn adjusted_variant_wins_over_raw() {
        let mut table = base_table();
        table.insert_column("temp_adjusted", floats(&[21.0, 20.5])).unwrap();

        let schema = ResolvedSchema::resolve(&table).unwrap();
        assert_eq!(schema.temperature, "temp_adjusted");
        assert_eq!(schema.pressure, "pres");

        let obs = SchemaNormalizer::normalize(&table, &schema);
        assert_eq!(obs[0].temperature, Some(21.0));
        assert_eq!(obs[1].temperature, Some(20.5));
    }

    #[test]
    fn every_missing_quantity_is_named() {
        let table = RawTable::from_columns([
            ("temp", floats(&[20.0])),
            ("latitude", floats(&[1.0])),
            ("longitude", floats(&[1.0])),
        ])
        .unwrap();

        let err = ResolvedSchema::resolve(&table).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingQuantities(vec![
                "pres/pres_adjusted".to_string(),
                "psal/psal_adjusted".to_string()
            ])
        );
    }

    #[test]
    fn missing_latitude_is_a_schema_error() {
        let table = RawTable::from_columns([
            ("pres", floats(&[5.0])),
            ("temp", floats(&[20.0])),
            ("psal", floats(&[35.0])),
            ("longitude", floats(&[60.0])),
        ])
        .unwrap();

        assert_eq!(
            ResolvedSchema::resolve(&table).unwrap_err(),
            SchemaError::MissingPosition(vec!["latitude".to_string()])
        );
    }

    #[test]
    fn qc_columns_follow_resolved_names() {
        let mut table = base_table();
        table.insert_column("psal_adjusted", floats(&[35.0, 35.0])).unwrap();

        let schema = ResolvedSchema::resolve(&table).unwrap();
        assert_eq!(
            schema.qc_columns(),
            ["pres_qc".to_string(), "temp_qc".to_string(), "psal_adjusted_qc".to_string()]
        );
    }

    #[test]
    fn unparseable_measurements_become_missing() {
        let mut table = base_table();
        table
            .insert_column("pres_adjusted", vec![Value::from("bad"), Value::from("12.5")])
            .unwrap();

        let schema = ResolvedSchema::resolve(&table).unwrap();
        let obs = SchemaNormalizer::normalize(&table, &schema);
        assert_eq!(obs[0].depth, None);
        assert_eq!(obs[1].depth, Some(12.5));
    }

    #[test]
    fn juld_becomes_utc_date_time() {
        let mut table = base_table();
        table.insert_column("juld", floats(&[25567.0, 25567.0])).unwrap();

        let schema = ResolvedSchema::resolve(&table).unwrap();
        let obs = SchemaNormalizer::normalize(&table, &schema);
        assert_eq!(obs[0].date_time, Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).single());
    }

    #[test]
    fn existing_date_time_takes_precedence_over_juld() {
        let mut table = base_table();
        table.insert_column("juld", floats(&[0.0, 0.0])).unwrap();
        table
            .insert_column("date_time", vec![Value::from("2022-02-02"), Value::Null])
            .unwrap();

        let schema = ResolvedSchema::resolve(&table).unwrap();
        let obs = SchemaNormalizer::normalize(&table, &schema);
        assert_eq!(obs[0].date_time, Utc.with_ymd_and_hms(2022, 2, 2, 0, 0, 0).single());
        assert_eq!(obs[1].date_time, None);
    }

    #[test]
    fn no_time_source_leaves_timestamps_missing() {
        let table = base_table();
        let schema = ResolvedSchema::resolve(&table).unwrap();
        let obs = SchemaNormalizer::normalize(&table, &schema);
        assert!(obs.iter().all(|o| o.date_time.is_none()));
        // одно место, одно (отсутствующее) время -> один профиль
        assert_eq!(obs[0].profile_id, obs[1].profile_id);
        assert!(obs[0].profile_id.is_some());
    }

    #[test]
    fn platform_and_cycle_define_profiles() {
        let mut table = base_table();
        table
            .insert_column("platform_number", vec![Value::from("1901605"), Value::from("1901605")])
            .unwrap();
        table.insert_column("cycle_number", vec![Value::Int(265), Value::Int(266)]).unwrap();

        let schema = ResolvedSchema::resolve(&table).unwrap();
        let obs = SchemaNormalizer::normalize(&table, &schema);
        assert_eq!(obs[0].profile_id, Some(ProfileId::Index(0)));
        assert_eq!(obs[1].profile_id, Some(ProfileId::Index(1)));
    }

    #[test]
    fn existing_profile_id_is_kept() {
        let mut table = base_table();
        table
            .insert_column("profile_id", vec![Value::from("a"), Value::Int(4)])
            .unwrap();

        let schema = ResolvedSchema::resolve(&table).unwrap();
        let obs = SchemaNormalizer::normalize(&table, &schema);
        assert_eq!(obs[0].profile_id, Some(ProfileId::Label("a".into())));
        assert_eq!(obs[1].profile_id, Some(ProfileId::Index(4)));
    }
}
