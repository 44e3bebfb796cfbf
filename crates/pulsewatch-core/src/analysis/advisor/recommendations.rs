use crate::analysis::advisor::{Advisor, SuggestedAction};
use crate::analysis::{AnomalyInsight, Metric, Severity};

// ============================================================
// Helpers
// ============================================================

fn action_for(
    advisor: &dyn Advisor,
    insight: &AnomalyInsight,
    suggestion: impl FnOnce(Severity) -> &'static str,
) -> Option<SuggestedAction> {
    if insight.metric != advisor.metric() {
        return None;
    }
    Some(SuggestedAction {
        metric: insight.metric,
        severity: insight.severity,
        suggestion: suggestion(insight.severity).to_string(),
    })
}

// ============================================================
// 1. CoolingAdvisor
// ============================================================

pub struct CoolingAdvisor;

impl Advisor for CoolingAdvisor {
    fn id(&self) -> &'static str {
        "cooling"
    }

    fn metric(&self) -> Metric {
        Metric::Temperature
    }

    fn evaluate(&self, insight: &AnomalyInsight) -> Option<SuggestedAction> {
        action_for(self, insight, |severity| match severity {
            Severity::High => "Check cooling systems and fans.",
            _ => "Monitor temperature closely.",
        })
    }
}

// ============================================================
// 2. MechanicalAdvisor
// ============================================================

pub struct MechanicalAdvisor;

impl Advisor for MechanicalAdvisor {
    fn id(&self) -> &'static str {
        "mechanical"
    }

    fn metric(&self) -> Metric {
        Metric::Vibration
    }

    fn evaluate(&self, insight: &AnomalyInsight) -> Option<SuggestedAction> {
        action_for(self, insight, |severity| match severity {
            Severity::Medium => "Inspect for imbalanced components or wear.",
            _ => "Check mounting and alignment.",
        })
    }
}

// ============================================================
// 3. PipelineAdvisor
// ============================================================

pub struct PipelineAdvisor;

impl Advisor for PipelineAdvisor {
    fn id(&self) -> &'static str {
        "pipeline"
    }

    fn metric(&self) -> Metric {
        Metric::Pressure
    }

    fn evaluate(&self, insight: &AnomalyInsight) -> Option<SuggestedAction> {
        action_for(self, insight, |severity| match severity {
            Severity::Medium => "Check for leaks or blockages in the pipeline.",
            _ => "Inspect pressure sensors.",
        })
    }
}
