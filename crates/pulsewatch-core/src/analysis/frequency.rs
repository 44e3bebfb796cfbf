use std::collections::BTreeMap;

use crate::analysis::{AnomalyFrequency, AnomalyInsight, Metric, Severity};

/// Counts insights per distinct (metric, severity) pair.
///
/// Rows come out in (metric, severity) order, but callers should not rely on it.
pub fn anomaly_frequency(insights: &[AnomalyInsight]) -> Vec<AnomalyFrequency> {
    let mut counts: BTreeMap<(Metric, Severity), usize> = BTreeMap::new();
    for insight in insights {
        *counts.entry((insight.metric, insight.severity)).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|((metric, severity), count)| AnomalyFrequency {
            metric,
            severity,
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_insight(time: i64, metric: Metric, severity: Severity) -> AnomalyInsight {
        AnomalyInsight {
            time,
            metric,
            severity,
            description: String::new(),
        }
    }

    #[test]
    fn counts_sum_to_insight_count() {
        let insights = vec![
            make_insight(0, Metric::Temperature, Severity::High),
            make_insight(60, Metric::Temperature, Severity::High),
            make_insight(60, Metric::Vibration, Severity::Medium),
            make_insight(120, Metric::Temperature, Severity::Low),
            make_insight(120, Metric::Pressure, Severity::Medium),
        ];
        let freq = anomaly_frequency(&insights);
        assert_eq!(freq.len(), 4);
        assert_eq!(freq.iter().map(|f| f.count).sum::<usize>(), insights.len());

        let temp_high = freq
            .iter()
            .find(|f| f.metric == Metric::Temperature && f.severity == Severity::High)
            .unwrap();
        assert_eq!(temp_high.count, 2);
    }

    #[test]
    fn empty_input_gives_empty_table() {
        assert!(anomaly_frequency(&[]).is_empty());
    }
}
