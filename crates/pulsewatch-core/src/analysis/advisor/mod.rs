pub mod recommendations;

use serde::{Deserialize, Serialize};

use super::{AnomalyInsight, Metric, Severity};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedAction {
    pub metric: Metric,
    pub severity: Severity,
    pub suggestion: String,
}

pub trait Advisor: Send + Sync {
    fn id(&self) -> &'static str;
    fn metric(&self) -> Metric;
    /// Returns `None` when the insight belongs to another metric.
    fn evaluate(&self, insight: &AnomalyInsight) -> Option<SuggestedAction>;
}

pub fn all_advisors() -> Vec<Box<dyn Advisor>> {
    vec![
        Box::new(recommendations::CoolingAdvisor),
        Box::new(recommendations::MechanicalAdvisor),
        Box::new(recommendations::PipelineAdvisor),
    ]
}

/// One suggestion per insight, in insight order. Insights no advisor
/// claims are skipped.
pub fn suggest_actions(
    advisors: &[Box<dyn Advisor>],
    insights: &[AnomalyInsight],
) -> Vec<SuggestedAction> {
    insights
        .iter()
        .filter_map(|insight| advisors.iter().find_map(|a| a.evaluate(insight)))
        .collect()
}
