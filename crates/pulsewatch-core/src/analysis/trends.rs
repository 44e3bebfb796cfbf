//! Weekly averages per metric, keyed by ISO week.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike};
use serde::{Deserialize, Serialize};

use crate::analysis::Metric;
use crate::reading::SensorReading;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub week: u32,
    /// ISO week-numbering year, which differs from the calendar year around
    /// New Year.
    pub year: i32,
    pub value: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyTrends {
    pub temperature: Vec<TrendPoint>,
    pub vibration: Vec<TrendPoint>,
    pub pressure: Vec<TrendPoint>,
}

impl WeeklyTrends {
    pub fn compute(readings: &[SensorReading]) -> Self {
        Self {
            temperature: weekly_trends(readings, Metric::Temperature),
            vibration: weekly_trends(readings, Metric::Vibration),
            pressure: weekly_trends(readings, Metric::Pressure),
        }
    }
}

fn field(reading: &SensorReading, metric: Metric) -> Option<f64> {
    match metric {
        Metric::Temperature => Some(reading.temperature),
        Metric::Vibration => Some(reading.vibration),
        Metric::Pressure => Some(reading.pressure),
        Metric::Unknown => None,
    }
}

/// Mean of one metric per ISO week, rounded to two decimals, oldest week first.
pub fn weekly_trends(readings: &[SensorReading], metric: Metric) -> Vec<TrendPoint> {
    let mut weeks: BTreeMap<(i32, u32), (f64, usize)> = BTreeMap::new();
    for reading in readings {
        let Some(value) = field(reading, metric) else {
            continue;
        };
        let Some(dt) = DateTime::from_timestamp(reading.timestamp, 0) else {
            continue;
        };
        let iso = dt.iso_week();
        let slot = weeks.entry((iso.year(), iso.week())).or_default();
        slot.0 += value;
        slot.1 += 1;
    }

    weeks
        .into_iter()
        .map(|((year, week), (sum, count))| TrendPoint {
            week,
            year,
            value: (sum / count as f64 * 100.0).round() / 100.0,
        })
        .collect()
}
