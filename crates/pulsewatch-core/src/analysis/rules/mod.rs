//! Static threshold rules shared by every stage that needs to know whether a
//! reading breached a limit (detector, impact estimator, heatmap).

pub mod pressure;
pub mod temperature;
pub mod vibration;

use crate::analysis::{Metric, Severity};
use crate::reading::SensorReading;

/// One threshold breach found in a single reading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Breach {
    pub metric: Metric,
    pub severity: Severity,
    pub value: f64,
    pub threshold: f64,
    pub description: &'static str,
}

pub trait AnalysisRule: Send + Sync {
    fn id(&self) -> &'static str;
    fn metric(&self) -> Metric;
    fn evaluate(&self, reading: &SensorReading) -> Option<Breach>;
}

pub fn all_rules() -> Vec<Box<dyn AnalysisRule>> {
    vec![
        Box::new(temperature::TemperatureHighRule),
        Box::new(vibration::VibrationHighRule),
        Box::new(pressure::PressureHighRule),
    ]
}

/// Evaluates every rule against one reading. Metrics are independent, so a
/// reading can yield zero to `rules.len()` breaches.
pub fn breaches<'a>(
    rules: &'a [Box<dyn AnalysisRule>],
    reading: &'a SensorReading,
) -> impl Iterator<Item = Breach> + 'a {
    rules.iter().filter_map(move |rule| rule.evaluate(reading))
}

/// Strict greater-than: a value sitting exactly on the limit is not a breach.
fn exceeds(value: f64, threshold: f64) -> bool {
    value > threshold
}
