use std::collections::BTreeMap;

use crate::analysis::{AlertScore, AnomalyInsight, Metric};

/// Ranks metrics by `severity_weight * frequency * impact_score`.
///
/// `impact_scores` maps a metric to its mean impact in 0..=1; metrics missing
/// from the map score 0. Output is sorted by final score descending, ties by
/// metric name ascending.
pub fn prioritize_alerts(
    insights: &[AnomalyInsight],
    impact_scores: &BTreeMap<Metric, f64>,
) -> Vec<AlertScore> {
    let mut per_metric: BTreeMap<Metric, (u32, usize)> = BTreeMap::new();
    for insight in insights {
        let slot = per_metric.entry(insight.metric).or_default();
        slot.0 += insight.severity.weight();
        slot.1 += 1;
    }

    let mut alerts: Vec<AlertScore> = per_metric
        .into_iter()
        .map(|(metric, (severity_weight, frequency))| {
            let impact_score = impact_scores.get(&metric).copied().unwrap_or(0.0);
            AlertScore {
                metric,
                severity_weight,
                frequency,
                impact_score,
                final_score: severity_weight as f64 * frequency as f64 * impact_score,
            }
        })
        .collect();

    alerts.sort_by(|a, b| {
        b.final_score
            .total_cmp(&a.final_score)
            .then_with(|| a.metric.as_str().cmp(b.metric.as_str()))
    });
    alerts
}
