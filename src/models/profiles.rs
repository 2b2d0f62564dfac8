//! Профили: назначение идентификаторов и группировка наблюдений

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::types::{Observation, ProfileId, Value};

/// Часть ключа группировки. Отсутствующее значение это отдельный тег,
/// а не NaN: такие строки попадают в свою группу, а не теряются.
#[derive(Debug, Clone)]
pub enum KeyPart {
    Number(f64),
    Instant(DateTime<Utc>),
    Text(String),
    Missing,
}

impl KeyPart {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => KeyPart::Missing,
            Value::Int(i) => KeyPart::Number(*i as f64),
            Value::Float(f) if f.is_nan() => KeyPart::Missing,
            // -0.0 и 0.0 должны совпадать
            Value::Float(f) => KeyPart::Number(*f + 0.0),
            Value::Timestamp(t) => KeyPart::Instant(*t),
            Value::Text(s) => KeyPart::Text(s.trim().to_string()),
            Value::Bool(b) => KeyPart::Text(b.to_string()),
        }
    }

    pub fn from_number(value: Option<f64>) -> Self {
        value.map_or(KeyPart::Missing, |v| KeyPart::Number(v + 0.0))
    }

    pub fn from_instant(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(KeyPart::Missing, KeyPart::Instant)
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, KeyPart::Missing)
    }

    fn rank(&self) -> u8 {
        match self {
            KeyPart::Number(_) => 0,
            KeyPart::Instant(_) => 1,
            KeyPart::Text(_) => 2,
            KeyPart::Missing => 3,
        }
    }
}

impl Ord for KeyPart {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyPart::Number(a), KeyPart::Number(b)) => a.total_cmp(b),
            (KeyPart::Instant(a), KeyPart::Instant(b)) => a.cmp(b),
            (KeyPart::Text(a), KeyPart::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for KeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for KeyPart {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyPart {}

/// Номера групп в порядке сортировки ключей. `None` в ключе -> строка без профиля.
fn number_groups<K: Ord>(keys: &[Option<K>]) -> Vec<Option<ProfileId>> {
    let mut ids: BTreeMap<&K, u64> = keys.iter().flatten().map(|k| (k, 0)).collect();
    for (next, id) in ids.values_mut().enumerate() {
        *id = next as u64;
    }

    keys.iter()
        .map(|k| k.as_ref().and_then(|k| ids.get(k)).map(|id| ProfileId::Index(*id)))
        .collect()
}

/// Профиль по паре (платформа, цикл). Строки без платформы или цикла получают `None`.
pub fn assign_by_platform_cycle(platform: &[Value], cycle: &[Value]) -> Vec<Option<ProfileId>> {
    let keys: Vec<Option<(KeyPart, KeyPart)>> = platform
        .iter()
        .zip(cycle)
        .map(|(p, c)| {
            let key = (KeyPart::from_value(p), KeyPart::from_value(c));
            (!key.0.is_missing() && !key.1.is_missing()).then_some(key)
        })
        .collect();

    number_groups(&keys)
}

/// Строки без профиля получают его по (широта, долгота, время).
/// Номера таких групп идут после уже выданных, чтобы не пересекаться с ними.
pub fn fill_missing_by_position(
    ids: &mut [Option<ProfileId>],
    latitude: &[Option<f64>],
    longitude: &[Option<f64>],
    date_time: &[Option<DateTime<Utc>>],
) {
    let missing: Vec<usize> = ids
        .iter()
        .enumerate()
        .filter(|(_, id)| id.is_none())
        .map(|(i, _)| i)
        .collect();
    if missing.is_empty() {
        return;
    }

    let offset = ids
        .iter()
        .filter_map(|id| match id {
            Some(ProfileId::Index(i)) => Some(i + 1),
            _ => None,
        })
        .max()
        .unwrap_or(0);

    let lat: Vec<_> = missing.iter().map(|&i| latitude[i]).collect();
    let lon: Vec<_> = missing.iter().map(|&i| longitude[i]).collect();
    let dt: Vec<_> = missing.iter().map(|&i| date_time[i]).collect();

    for (&row, id) in missing.iter().zip(assign_by_position(&lat, &lon, &dt)) {
        ids[row] = id.map(|id| match id {
            ProfileId::Index(i) => ProfileId::Index(offset + i),
            label => label,
        });
    }

    tracing::warn!("{} rows without platform/cycle grouped by position", missing.len());
}

/// Профиль по (широта, долгота, время); отсутствующее время это своё значение ключа.
pub fn assign_by_position(
    latitude: &[Option<f64>],
    longitude: &[Option<f64>],
    date_time: &[Option<DateTime<Utc>>],
) -> Vec<Option<ProfileId>> {
    let keys: Vec<Option<(KeyPart, KeyPart, KeyPart)>> = latitude
        .iter()
        .zip(longitude)
        .zip(date_time)
        .map(|((lat, lon), dt)| {
            Some((
                KeyPart::from_number(*lat),
                KeyPart::from_number(*lon),
                KeyPart::from_instant(*dt),
            ))
        })
        .collect();

    number_groups(&keys)
}

/// Присваивает профили по позиции и времени, если ни у одного наблюдения их нет.
pub fn ensure_profile_ids(observations: &mut [Observation]) {
    if observations.iter().any(|o| o.profile_id.is_some()) {
        return;
    }

    let latitude: Vec<_> = observations.iter().map(|o| o.latitude).collect();
    let longitude: Vec<_> = observations.iter().map(|o| o.longitude).collect();
    let date_time: Vec<_> = observations.iter().map(|o| o.date_time).collect();

    let ids = assign_by_position(&latitude, &longitude, &date_time);
    for (obs, id) in observations.iter_mut().zip(ids) {
        obs.profile_id = id;
    }
}

/// Представление группы строк с одним `profile_id`.
#[derive(Debug, Clone)]
pub struct Profile<'a> {
    pub id: &'a ProfileId,
    /// Индексы строк в исходном срезе
    pub rows: Vec<usize>,
    source: &'a [Observation],
}

impl<'a> Profile<'a> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn observations(&self) -> impl Iterator<Item = &'a Observation> + '_ {
        let source = self.source;
        self.rows.iter().map(move |&i| &source[i])
    }
}

pub struct ProfileGrouper;

impl ProfileGrouper {
    /// Группы в порядке `profile_id`. Строки без профиля не попадают ни в одну группу.
    pub fn group(observations: &[Observation]) -> impl Iterator<Item = Profile<'_>> {
        let mut groups: BTreeMap<&ProfileId, Vec<usize>> = BTreeMap::new();
        for (i, obs) in observations.iter().enumerate() {
            if let Some(id) = &obs.profile_id {
                groups.entry(id).or_default().push(i);
            }
        }

        groups.into_iter().map(move |(id, rows)| Profile {
            id,
            rows,
            source: observations,
        })
    }
}
