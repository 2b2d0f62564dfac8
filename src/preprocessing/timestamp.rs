//! Время наблюдений: JULD и приведение к UTC

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::types::Value;

/// 1950-01-01T00:00:00Z в секундах Unix (эпоха Argo)
pub const ARGO_EPOCH_UNIX_SECONDS: i64 = -631_152_000;

const MICROS_PER_DAY: f64 = 86_400_000_000.0;

const NAIVE_DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Как закодирован JULD в конкретной колонке
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JuldEncoding {
    /// Колонка уже содержит моменты времени
    Temporal,
    /// Дни (дробные) от эпохи Argo
    DayOffset,
    /// Текстовые даты
    Text,
}

impl JuldEncoding {
    pub fn detect(values: &[Value]) -> Self {
        let mut non_null = values.iter().filter(|v| !v.is_null()).peekable();

        if non_null.peek().is_some() && non_null.all(|v| v.as_timestamp().is_some()) {
            JuldEncoding::Temporal
        } else if values.iter().any(|v| v.as_number().is_some()) {
            JuldEncoding::DayOffset
        } else {
            JuldEncoding::Text
        }
    }
}

/// Дни от 1950-01-01 UTC -> момент времени. Точность до микросекунды.
pub fn from_julian_day(days: f64) -> Option<DateTime<Utc>> {
    if !days.is_finite() {
        return None;
    }

    let micros = (days * MICROS_PER_DAY).round();
    // за пределами этого диапазона chrono всё равно не представит дату
    if micros.abs() > 1e17 {
        return None;
    }
    let micros = micros as i64;

    let secs = micros.div_euclid(1_000_000);
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    DateTime::from_timestamp(ARGO_EPOCH_UNIX_SECONDS + secs, nanos)
}

/// Разбор произвольной текстовой даты. Значения без зоны считаются UTC.
pub fn parse_datetime_text(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f %z") {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `date_time` из колонки JULD. Испорченные значения дают `None` для своей строки.
pub fn decode_juld(values: &[Value]) -> Vec<Option<DateTime<Utc>>> {
    let encoding = JuldEncoding::detect(values);
    tracing::debug!("JULD encoding detected: {:?}", encoding);

    values
        .iter()
        .map(|v| match (encoding, v) {
            (_, Value::Timestamp(t)) => Some(*t),
            (JuldEncoding::DayOffset, v) => v.as_number().and_then(from_julian_day),
            (JuldEncoding::Text, Value::Text(s)) => parse_datetime_text(s),
            _ => None,
        })
        .collect()
}

/// Приведение уже существующей колонки `date_time` к UTC.
pub fn normalize_date_time(values: &[Value]) -> Vec<Option<DateTime<Utc>>> {
    values
        .iter()
        .map(|v| match v {
            Value::Timestamp(t) => Some(*t),
            Value::Text(s) => parse_datetime_text(s),
            _ => None,
        })
        .collect()
}
