//! Threshold detector: readings → anomaly insights.

use tracing::trace;

use crate::analysis::AnomalyInsight;
use crate::analysis::rules::{AnalysisRule, breaches};
use crate::reading::{RawReading, SensorReading, Validation, validate};
use crate::util::minute_key;

/// Emits one insight per breached rule per reading, in reading order.
/// Insight time is the reading timestamp truncated to the minute.
pub fn detect(rules: &[Box<dyn AnalysisRule>], readings: &[SensorReading]) -> Vec<AnomalyInsight> {
    let mut insights = Vec::new();
    for reading in readings {
        let time = minute_key(reading.timestamp);
        insights.extend(breaches(rules, reading).map(|b| {
            trace!(
                time,
                metric = %b.metric,
                value = b.value,
                threshold = b.threshold,
                "threshold breached"
            );
            AnomalyInsight {
                time,
                metric: b.metric,
                severity: b.severity,
                description: b.description.to_string(),
            }
        }));
    }
    insights
}

/// Validates a raw batch and runs detection over the valid remainder.
/// Malformed rows are returned in `Validation::errors` and produce no insights.
pub fn detect_raw(
    rules: &[Box<dyn AnalysisRule>],
    raw: &[RawReading],
) -> (Vec<AnomalyInsight>, Validation) {
    let validation = validate(raw);
    let insights = detect(rules, &validation.sensor_readings());
    (insights, validation)
}
