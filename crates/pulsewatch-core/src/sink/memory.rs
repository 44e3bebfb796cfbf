use std::sync::Mutex;

use crate::analysis::AnomalyInsight;
use crate::sink::{AlertNotifier, AnomalySink, HighRiskAlert, SinkError};

/// Keeps stored insights in a `Vec`.
#[derive(Debug, Default)]
pub struct MemorySink {
    insights: Vec<AnomalyInsight>,
    capacity_limit: Option<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects any batch that would grow the sink past `limit` insights.
    pub fn with_capacity_limit(limit: usize) -> Self {
        Self {
            insights: Vec::new(),
            capacity_limit: Some(limit),
        }
    }

    pub fn insights(&self) -> &[AnomalyInsight] {
        &self.insights
    }
}

impl AnomalySink for MemorySink {
    fn id(&self) -> &'static str {
        "memory"
    }

    fn store(&mut self, insights: &[AnomalyInsight]) -> Result<(), SinkError> {
        if let Some(limit) = self.capacity_limit
            && self.insights.len() + insights.len() > limit
        {
            return Err(SinkError::Rejected(format!(
                "batch of {} exceeds capacity {} ({} stored)",
                insights.len(),
                limit,
                self.insights.len()
            )));
        }
        self.insights.extend_from_slice(insights);
        Ok(())
    }
}

/// Records every alert it is given.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    alerts: Mutex<Vec<HighRiskAlert>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<HighRiskAlert> {
        match self.alerts.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AlertNotifier for MemoryNotifier {
    fn id(&self) -> &'static str {
        "memory"
    }

    fn notify(&self, alert: &HighRiskAlert) -> Result<(), SinkError> {
        let mut alerts = self
            .alerts
            .lock()
            .map_err(|_| SinkError::Rejected("notifier state poisoned".to_string()))?;
        alerts.push(alert.clone());
        Ok(())
    }
}
