//! Impact estimator: re-scans raw readings with the shared rule table and
//! attaches a fixed, metric-specific risk score to each breach.

use std::collections::BTreeMap;

use crate::analysis::rules::{AnalysisRule, breaches};
use crate::analysis::{ImpactEntry, Metric};
use crate::reading::SensorReading;

pub fn compute_impacts(
    rules: &[Box<dyn AnalysisRule>],
    readings: &[SensorReading],
) -> Vec<ImpactEntry> {
    let mut impacts = Vec::new();
    for reading in readings {
        impacts.extend(breaches(rules, reading).map(|b| ImpactEntry {
            time: reading.timestamp,
            metric: b.metric,
            impact: b.metric.impact().to_string(),
            risk_score: b.metric.risk_score(),
        }));
    }
    impacts
}

/// Mean of `risk_score / 100` per metric, in 0..=1.
pub fn impact_score_per_metric(impacts: &[ImpactEntry]) -> BTreeMap<Metric, f64> {
    let mut sums: BTreeMap<Metric, (u32, usize)> = BTreeMap::new();
    for entry in impacts {
        let slot = sums.entry(entry.metric).or_default();
        slot.0 += entry.risk_score;
        slot.1 += 1;
    }
    sums.into_iter()
        .map(|(metric, (total, n))| (metric, total as f64 / 100.0 / n as f64))
        .collect()
}
