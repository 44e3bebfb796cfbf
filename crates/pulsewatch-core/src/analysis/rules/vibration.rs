use crate::analysis::{Metric, Severity};
use crate::reading::SensorReading;

use super::{AnalysisRule, Breach, exceeds};

/// RMS displacement limit in the sensor's native unit.
pub const VIBRATION_LIMIT: f64 = 0.07;

// ============================================================
// VibrationHighRule
// ============================================================

pub struct VibrationHighRule;

impl AnalysisRule for VibrationHighRule {
    fn id(&self) -> &'static str {
        "vibration_high"
    }

    fn metric(&self) -> Metric {
        Metric::Vibration
    }

    fn evaluate(&self, reading: &SensorReading) -> Option<Breach> {
        if !exceeds(reading.vibration, VIBRATION_LIMIT) {
            return None;
        }

        Some(Breach {
            metric: Metric::Vibration,
            severity: Severity::Medium,
            value: reading.vibration,
            threshold: VIBRATION_LIMIT,
            description: "Unusual vibration. Possible imbalance or wear.",
        })
    }
}
