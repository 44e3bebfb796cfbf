use crate::analysis::{Metric, Severity};
use crate::reading::SensorReading;

use super::{AnalysisRule, Breach, exceeds};

pub const TEMPERATURE_LIMIT: f64 = 80.0;

// ============================================================
// TemperatureHighRule
// ============================================================

pub struct TemperatureHighRule;

impl AnalysisRule for TemperatureHighRule {
    fn id(&self) -> &'static str {
        "temperature_high"
    }

    fn metric(&self) -> Metric {
        Metric::Temperature
    }

    fn evaluate(&self, reading: &SensorReading) -> Option<Breach> {
        if !exceeds(reading.temperature, TEMPERATURE_LIMIT) {
            return None;
        }

        Some(Breach {
            metric: Metric::Temperature,
            severity: Severity::High,
            value: reading.temperature,
            threshold: TEMPERATURE_LIMIT,
            description: "Overheating detected. Consider cooling inspection.",
        })
    }
}
