use crate::analysis::{Metric, Severity};
use crate::reading::SensorReading;

use super::{AnalysisRule, Breach, exceeds};

/// Upper bound in hPa.
pub const PRESSURE_LIMIT: f64 = 1015.0;

// ============================================================
// PressureHighRule
// ============================================================

pub struct PressureHighRule;

impl AnalysisRule for PressureHighRule {
    fn id(&self) -> &'static str {
        "pressure_high"
    }

    fn metric(&self) -> Metric {
        Metric::Pressure
    }

    fn evaluate(&self, reading: &SensorReading) -> Option<Breach> {
        if !exceeds(reading.pressure, PRESSURE_LIMIT) {
            return None;
        }

        Some(Breach {
            metric: Metric::Pressure,
            severity: Severity::Medium,
            value: reading.pressure,
            threshold: PRESSURE_LIMIT,
            description: "Pressure exceeds expected limits. Check for blockages.",
        })
    }
}
