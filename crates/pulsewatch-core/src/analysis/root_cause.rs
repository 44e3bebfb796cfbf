use crate::analysis::{AnomalyInsight, Metric, RootCauseEntry, Severity};

/// Fixed causal hypothesis for a (metric, severity) pair.
///
/// The text follows the severity each metric's rule emits; any other
/// severity for that metric gets the milder wording.
pub fn root_cause_for(metric: Metric, severity: Severity) -> &'static str {
    match (metric, severity) {
        (Metric::Temperature, Severity::High) => "Overheating due to insufficient cooling.",
        (Metric::Temperature, _) => "Minor temperature fluctuations.",
        (Metric::Vibration, Severity::Medium) => "Possible imbalance in rotating components.",
        (Metric::Vibration, _) => "Minor vibration due to normal operation.",
        (Metric::Pressure, Severity::Medium) => "Potential blockage or leak in the system.",
        (Metric::Pressure, _) => "Minor pressure variations.",
        (Metric::Unknown, _) => "Unknown cause.",
    }
}

pub fn generate_root_causes(insights: &[AnomalyInsight]) -> Vec<RootCauseEntry> {
    insights
        .iter()
        .map(|i| RootCauseEntry {
            time: i.time,
            metric: i.metric,
            severity: i.severity,
            root_cause: root_cause_for(i.metric, i.severity).to_string(),
        })
        .collect()
}
