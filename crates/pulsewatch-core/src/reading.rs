//! Sensor readings: raw input, validation, and content fingerprinting.
//!
//! Readings arrive from an external source (CSV upload, live feed) as
//! `RawReading` values. `validate()` turns them into `SensorReading`s and
//! reports every malformed row as an `InputError` carrying the row index,
//! without discarding the rest of the batch.

use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;

use crate::util::parse_timestamp;

/// One validated multi-sensor sample. Timestamp is Unix seconds (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub timestamp: i64,
    pub temperature: f64,
    pub vibration: f64,
    pub pressure: f64,
}

/// One field as supplied by the reading source, before any type checks.
///
/// Deserialization never fails on a field value: strings, nulls and the
/// wrong JSON types are kept so validation can report them per reading.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RawValue {
    Integer(i64),
    Number(f64),
    Text(String),
    #[default]
    Missing,
    /// A JSON type no reading field accepts (bool, array, object).
    Unsupported(&'static str),
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Integer(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl Serialize for RawValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RawValue::Integer(v) => serializer.serialize_i64(*v),
            RawValue::Number(v) => serializer.serialize_f64(*v),
            RawValue::Text(s) => serializer.serialize_str(s),
            RawValue::Missing | RawValue::Unsupported(_) => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for RawValue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RawValueVisitor)
    }
}

struct RawValueVisitor;

impl<'de> Visitor<'de> for RawValueVisitor {
    type Value = RawValue;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a reading field value")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<RawValue, E> {
        Ok(RawValue::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<RawValue, E> {
        Ok(i64::try_from(v).map_or(RawValue::Number(v as f64), RawValue::Integer))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<RawValue, E> {
        Ok(RawValue::Number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<RawValue, E> {
        Ok(RawValue::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<RawValue, E> {
        Ok(RawValue::Text(v))
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<RawValue, E> {
        Ok(RawValue::Unsupported("boolean"))
    }

    fn visit_unit<E: de::Error>(self) -> Result<RawValue, E> {
        Ok(RawValue::Missing)
    }

    fn visit_none<E: de::Error>(self) -> Result<RawValue, E> {
        Ok(RawValue::Missing)
    }

    fn visit_some<D: serde::Deserializer<'de>>(self, d: D) -> Result<RawValue, D::Error> {
        RawValue::deserialize(d)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<RawValue, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(RawValue::Unsupported("array"))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawValue, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(RawValue::Unsupported("object"))
    }
}

/// Unvalidated reading as delivered by a source collaborator. Absent fields
/// deserialize as `RawValue::Missing`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    #[serde(default)]
    pub timestamp: RawValue,
    #[serde(default)]
    pub temperature: RawValue,
    #[serde(default)]
    pub vibration: RawValue,
    #[serde(default)]
    pub pressure: RawValue,
}

impl RawReading {
    pub fn new(
        timestamp: impl Into<String>,
        temperature: f64,
        vibration: f64,
        pressure: f64,
    ) -> Self {
        Self {
            timestamp: RawValue::Text(timestamp.into()),
            temperature: RawValue::Number(temperature),
            vibration: RawValue::Number(vibration),
            pressure: RawValue::Number(pressure),
        }
    }
}

/// A validated reading together with its position in the source batch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IndexedReading {
    pub index: usize,
    pub reading: SensorReading,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputField {
    Timestamp,
    Temperature,
    Vibration,
    Pressure,
}

impl InputField {
    pub fn as_str(self) -> &'static str {
        match self {
            InputField::Timestamp => "timestamp",
            InputField::Temperature => "temperature",
            InputField::Vibration => "vibration",
            InputField::Pressure => "pressure",
        }
    }
}

/// Malformed field in one reading of the batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputError {
    pub index: usize,
    pub field: InputField,
    pub message: String,
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Invalid {} in reading #{}: {}",
            self.field.as_str(),
            self.index,
            self.message
        )
    }
}

impl std::error::Error for InputError {}

/// Outcome of validating a raw batch.
#[derive(Debug, Default)]
pub struct Validation {
    pub readings: Vec<IndexedReading>,
    pub errors: Vec<InputError>,
}

impl Validation {
    pub fn sensor_readings(&self) -> Vec<SensorReading> {
        self.readings.iter().map(|r| r.reading).collect()
    }
}

fn field_error(index: usize, field: InputField, message: impl Into<String>) -> InputError {
    InputError {
        index,
        field,
        message: message.into(),
    }
}

fn parse_raw_timestamp(index: usize, value: &RawValue) -> Result<i64, InputError> {
    let err = |message: String| field_error(index, InputField::Timestamp, message);
    match value {
        RawValue::Integer(ts) => Ok(*ts),
        // Fractional Unix seconds are truncated to the whole second.
        RawValue::Number(ts) if ts.is_finite() && ts.abs() < i64::MAX as f64 => {
            Ok(ts.trunc() as i64)
        }
        RawValue::Number(ts) => Err(err(format!("timestamp {ts} is out of range"))),
        RawValue::Text(s) => parse_timestamp(s).map_err(|e| err(e.to_string())),
        RawValue::Missing => Err(err("missing value".to_string())),
        RawValue::Unsupported(kind) => Err(err(format!("expected a time, got {kind}"))),
    }
}

fn parse_raw_number(index: usize, field: InputField, value: &RawValue) -> Result<f64, InputError> {
    let number = match value {
        RawValue::Integer(v) => *v as f64,
        RawValue::Number(v) => *v,
        RawValue::Text(s) => s.trim().parse::<f64>().map_err(|_| {
            field_error(index, field, format!("expected a number, got {s:?}"))
        })?,
        RawValue::Missing => return Err(field_error(index, field, "missing value")),
        RawValue::Unsupported(kind) => {
            return Err(field_error(index, field, format!("expected a number, got {kind}")));
        }
    };
    if !number.is_finite() {
        return Err(field_error(index, field, format!("non-finite value {number}")));
    }
    Ok(number)
}

/// Checks that an already typed reading carries only finite sensor values.
pub fn check_reading(index: usize, reading: &SensorReading) -> Result<(), InputError> {
    for (field, value) in [
        (InputField::Temperature, reading.temperature),
        (InputField::Vibration, reading.vibration),
        (InputField::Pressure, reading.pressure),
    ] {
        if !value.is_finite() {
            return Err(field_error(index, field, format!("non-finite value {value}")));
        }
    }
    Ok(())
}

/// Validates one raw reading. The first malformed field wins.
pub fn validate_reading(index: usize, raw: &RawReading) -> Result<SensorReading, InputError> {
    Ok(SensorReading {
        timestamp: parse_raw_timestamp(index, &raw.timestamp)?,
        temperature: parse_raw_number(index, InputField::Temperature, &raw.temperature)?,
        vibration: parse_raw_number(index, InputField::Vibration, &raw.vibration)?,
        pressure: parse_raw_number(index, InputField::Pressure, &raw.pressure)?,
    })
}

/// Validates a whole batch, keeping source order.
pub fn validate(raw: &[RawReading]) -> Validation {
    let mut out = Validation::default();
    for (index, r) in raw.iter().enumerate() {
        match validate_reading(index, r) {
            Ok(reading) => out.readings.push(IndexedReading { index, reading }),
            Err(e) => out.errors.push(e),
        }
    }
    out
}

/// Validates readings that were built in code rather than parsed, dropping
/// the ones with non-finite values.
pub fn validate_typed(readings: &[SensorReading]) -> Validation {
    let mut out = Validation::default();
    for (index, reading) in readings.iter().enumerate() {
        match check_reading(index, reading) {
            Ok(()) => out.readings.push(IndexedReading {
                index,
                reading: *reading,
            }),
            Err(e) => out.errors.push(e),
        }
    }
    out
}

/// Keeps readings whose timestamp lies in the inclusive `[start, end]` window.
pub fn filter_range(readings: &[SensorReading], start: i64, end: i64) -> Vec<SensorReading> {
    readings
        .iter()
        .filter(|r| r.timestamp >= start && r.timestamp <= end)
        .copied()
        .collect()
}

/// Content hash of a reading batch, usable as a cache key for analysis results.
pub fn fingerprint(readings: &[SensorReading]) -> u64 {
    let mut hasher = Xxh3::new();
    for r in readings {
        hasher.update(&r.timestamp.to_le_bytes());
        hasher.update(&r.temperature.to_bits().to_le_bytes());
        hasher.update(&r.vibration.to_bits().to_le_bytes());
        hasher.update(&r.pressure.to_bits().to_le_bytes());
    }
    hasher.digest()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_keeps_good_rows_and_reports_bad_ones() {
        let raw = vec![
            RawReading::new("2024-05-01T10:00:00Z", 70.0, 0.05, 1000.0),
            RawReading::new("not a time", 90.0, 0.05, 1000.0),
            RawReading {
                timestamp: RawValue::Integer(1_714_557_660),
                temperature: RawValue::Number(71.0),
                vibration: RawValue::Number(f64::NAN),
                pressure: RawValue::Number(1000.0),
            },
            RawReading {
                timestamp: RawValue::Integer(1_714_557_720),
                temperature: RawValue::Number(72.0),
                vibration: RawValue::Number(0.01),
                pressure: RawValue::Number(1001.0),
            },
        ];

        let v = validate(&raw);
        assert_eq!(v.readings.len(), 2);
        assert_eq!(v.readings[0].index, 0);
        assert_eq!(v.readings[1].index, 3);

        assert_eq!(v.errors.len(), 2);
        assert_eq!(v.errors[0].index, 1);
        assert_eq!(v.errors[0].field, InputField::Timestamp);
        assert_eq!(v.errors[1].index, 2);
        assert_eq!(v.errors[1].field, InputField::Vibration);
        assert!(v.errors[1].to_string().contains("reading #2"));
    }

    #[test]
    fn raw_reading_accepts_numeric_and_text_timestamps() {
        let raw: Vec<RawReading> = serde_json::from_str(
            r#"[
                {"timestamp":60,"temperature":1.0,"vibration":0.0,"pressure":1.0},
                {"timestamp":"1970-01-01 00:02","temperature":1.0,"vibration":0.0,"pressure":1.0},
                {"timestamp":180.75,"temperature":1,"vibration":"0.5","pressure":1.0}
            ]"#,
        )
        .unwrap();
        let v = validate(&raw);
        assert!(v.errors.is_empty());
        assert_eq!(v.readings[0].reading.timestamp, 60);
        assert_eq!(v.readings[1].reading.timestamp, 120);
        assert_eq!(v.readings[2].reading.timestamp, 180);
        assert_eq!(v.readings[2].reading.temperature, 1.0);
        assert_eq!(v.readings[2].reading.vibration, 0.5);
    }

    #[test]
    fn malformed_json_fields_are_indexed_errors() {
        let raw: Vec<RawReading> = serde_json::from_str(
            r#"[
                {"timestamp":1714557600,"temperature":85.0,"vibration":0.01,"pressure":1000.0},
                {"timestamp":1714557660,"temperature":"n/a","vibration":0.01,"pressure":1000.0},
                {"timestamp":1714557720,"temperature":70.0,"vibration":null,"pressure":1000.0},
                {"timestamp":1714557780,"temperature":70.0,"vibration":0.01},
                {"timestamp":true,"temperature":70.0,"vibration":0.01,"pressure":1000.0},
                {"timestamp":1714557900,"temperature":70.0,"vibration":[1],"pressure":1000.0},
                {"timestamp":1714557960.0,"temperature":70.0,"vibration":0.09,"pressure":1000.0}
            ]"#,
        )
        .unwrap();
        assert_eq!(raw.len(), 7);

        let v = validate(&raw);
        let kept: Vec<usize> = v.readings.iter().map(|r| r.index).collect();
        assert_eq!(kept, vec![0, 6]);
        assert_eq!(v.readings[1].reading.timestamp, 1_714_557_960);

        let errors: Vec<(usize, InputField)> =
            v.errors.iter().map(|e| (e.index, e.field)).collect();
        assert_eq!(
            errors,
            vec![
                (1, InputField::Temperature),
                (2, InputField::Vibration),
                (3, InputField::Pressure),
                (4, InputField::Timestamp),
                (5, InputField::Vibration),
            ]
        );
        assert!(v.errors[0].message.contains("n/a"));
        assert_eq!(v.errors[1].message, "missing value");
        assert_eq!(v.errors[2].message, "missing value");
    }

    #[test]
    fn text_nan_is_rejected() {
        let raw = RawReading {
            temperature: RawValue::from("NaN"),
            ..RawReading::new("2024-05-01T10:00:00Z", 0.0, 0.01, 1000.0)
        };
        let err = validate_reading(4, &raw).unwrap_err();
        assert_eq!(err.field, InputField::Temperature);
        assert_eq!(err.index, 4);
    }

    #[test]
    fn typed_readings_drop_non_finite_values() {
        let good = SensorReading {
            timestamp: 60,
            temperature: 20.0,
            vibration: 0.01,
            pressure: 1000.0,
        };
        let bad = SensorReading {
            pressure: f64::INFINITY,
            ..good
        };
        let v = validate_typed(&[bad, good]);
        assert_eq!(v.sensor_readings(), vec![good]);
        assert_eq!(v.errors.len(), 1);
        assert_eq!(v.errors[0].index, 0);
        assert_eq!(v.errors[0].field, InputField::Pressure);
    }

    #[test]
    fn filter_range_is_inclusive() {
        let readings: Vec<SensorReading> = (0..5)
            .map(|i| SensorReading {
                timestamp: i * 60,
                temperature: 20.0,
                vibration: 0.01,
                pressure: 1000.0,
            })
            .collect();
        let kept = filter_range(&readings, 60, 180);
        assert_eq!(
            kept.iter().map(|r| r.timestamp).collect::<Vec<_>>(),
            vec![60, 120, 180]
        );
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = SensorReading {
            timestamp: 0,
            temperature: 20.0,
            vibration: 0.01,
            pressure: 1000.0,
        };
        let mut b = a;
        b.pressure = 1000.5;
        assert_eq!(fingerprint(&[a, b]), fingerprint(&[a, b]));
        assert_ne!(fingerprint(&[a, b]), fingerprint(&[b, a]));
        assert_ne!(fingerprint(&[a]), fingerprint(&[a, a]));
    }
}
