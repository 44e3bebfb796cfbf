use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::Metric;
use crate::analysis::rules::{AnalysisRule, breaches};
use crate::reading::SensorReading;
use crate::util::hour_key;

/// Which metrics breached their limit at least once during one UTC hour.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapCell {
    /// Start of the hour, Unix seconds.
    pub hour: i64,
    pub temperature: bool,
    pub vibration: bool,
    pub pressure: bool,
}

impl HeatmapCell {
    fn mark(&mut self, metric: Metric) {
        match metric {
            Metric::Temperature => self.temperature = true,
            Metric::Vibration => self.vibration = true,
            Metric::Pressure => self.pressure = true,
            Metric::Unknown => {}
        }
    }
}

/// One cell per hour that has readings, sorted by hour.
pub fn hourly_heatmap(
    rules: &[Box<dyn AnalysisRule>],
    readings: &[SensorReading],
) -> Vec<HeatmapCell> {
    let mut cells: BTreeMap<i64, HeatmapCell> = BTreeMap::new();
    for reading in readings {
        let hour = hour_key(reading.timestamp);
        let cell = cells.entry(hour).or_insert_with(|| HeatmapCell {
            hour,
            ..Default::default()
        });
        for breach in breaches(rules, reading) {
            cell.mark(breach.metric);
        }
    }
    cells.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::rules::all_rules;

    fn make_reading(
        timestamp: i64,
        temperature: f64,
        vibration: f64,
        pressure: f64,
    ) -> SensorReading {
        SensorReading {
            timestamp,
            temperature,
            vibration,
            pressure,
        }
    }

    #[test]
    fn flags_accumulate_within_the_hour() {
        let readings = vec![
            make_reading(7200 + 10, 20.0, 0.01, 1000.0),
            make_reading(3600 + 59, 85.0, 0.01, 1000.0),
            make_reading(3600 + 3599, 20.0, 0.01, 1020.0),
            make_reading(7200 + 600, 20.0, 0.01, 1000.0),
        ];
        let cells = hourly_heatmap(&all_rules(), &readings);
        assert_eq!(
            cells,
            vec![
                HeatmapCell {
                    hour: 3600,
                    temperature: true,
                    vibration: false,
                    pressure: true,
                },
                HeatmapCell {
                    hour: 7200,
                    ..Default::default()
                },
            ]
        );
    }

    #[test]
    fn empty_readings() {
        assert!(hourly_heatmap(&all_rules(), &[]).is_empty());
    }
}
