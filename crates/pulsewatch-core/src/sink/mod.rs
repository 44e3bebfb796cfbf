//! Outbound collaborators: where insights are stored and who is told about
//! high-risk hypotheses.
//!
//! Analysis never depends on these. `dispatch` feeds a finished
//! [`AnalysisResult`] to every sink and notifier, logs each failure and keeps
//! going.

pub mod memory;

pub use memory::{MemoryNotifier, MemorySink};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analysis::rules::{AnalysisRule, all_rules};
use crate::analysis::{AnalysisResult, AnomalyInsight, Metric, Severity};
use crate::reading::SensorReading;
use crate::util::minute_key;

/// Error type for sink and notifier failures.
#[derive(Debug)]
pub enum SinkError {
    /// I/O error writing to the backing store.
    Io(std::io::Error),
    /// The collaborator refused the payload.
    Rejected(String),
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkError::Io(e) => write!(f, "I/O error: {}", e),
            SinkError::Rejected(msg) => write!(f, "rejected: {}", msg),
        }
    }
}

impl std::error::Error for SinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SinkError::Io(e) => Some(e),
            SinkError::Rejected(_) => None,
        }
    }
}

impl From<std::io::Error> for SinkError {
    fn from(e: std::io::Error) -> Self {
        SinkError::Io(e)
    }
}

/// A high-severity root cause confident enough to page someone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighRiskAlert {
    pub time: i64,
    pub metric: Metric,
    pub severity: Severity,
    pub confidence: f64,
    pub root_cause: String,
    /// First reading in the alert's minute that breached the same metric.
    pub reading: Option<SensorReading>,
}

pub trait AnomalySink: Send {
    fn id(&self) -> &'static str;
    fn store(&mut self, insights: &[AnomalyInsight]) -> Result<(), SinkError>;
}

pub trait AlertNotifier: Send + Sync {
    fn id(&self) -> &'static str;
    fn notify(&self, alert: &HighRiskAlert) -> Result<(), SinkError>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchFailure {
    pub collaborator: String,
    pub error: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
    /// Number of sinks that accepted the insight batch.
    pub stored: usize,
    /// Number of alerts delivered, counted once per notifier.
    pub notified: usize,
    pub failures: Vec<DispatchFailure>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, collaborator: &str, error: SinkError) {
        warn!(collaborator, error = %error, "dispatch failed");
        self.failures.push(DispatchFailure {
            collaborator: collaborator.to_string(),
            error: error.to_string(),
        });
    }
}

/// Scored root causes with severity High and confidence at or above
/// `min_confidence`, in result order.
pub fn high_risk_alerts(result: &AnalysisResult, min_confidence: f64) -> Vec<HighRiskAlert> {
    let rules = all_rules();
    result
        .scored_root_causes
        .iter()
        .filter(|s| s.entry.severity == Severity::High && s.confidence >= min_confidence)
        .map(|s| HighRiskAlert {
            time: s.entry.time,
            metric: s.entry.metric,
            severity: s.entry.severity,
            confidence: s.confidence,
            root_cause: s.entry.root_cause.clone(),
            reading: matching_reading(&rules, result, s.entry.time, s.entry.metric),
        })
        .collect()
}

/// Clustered points are exactly the readings that share a minute with some
/// insight, so the source reading of an alert is among them.
fn matching_reading(
    rules: &[Box<dyn AnalysisRule>],
    result: &AnalysisResult,
    time: i64,
    metric: Metric,
) -> Option<SensorReading> {
    result
        .clusters
        .iter()
        .filter(|p| minute_key(p.timestamp) == time)
        .map(|p| SensorReading {
            timestamp: p.timestamp,
            temperature: p.temperature,
            vibration: p.vibration,
            pressure: p.pressure,
        })
        .find(|r| rules.iter().any(|rule| rule.metric() == metric && rule.evaluate(r).is_some()))
}

/// Stores the result's insights in every sink and sends each high-risk alert
/// to every notifier. Failures are collected, never raised.
pub fn dispatch(
    result: &AnalysisResult,
    sinks: &mut [&mut dyn AnomalySink],
    notifiers: &[&dyn AlertNotifier],
    min_confidence: f64,
) -> DispatchReport {
    let mut report = DispatchReport::default();

    for sink in sinks.iter_mut() {
        match sink.store(&result.insights) {
            Ok(()) => report.stored += 1,
            Err(e) => report.record(sink.id(), e),
        }
    }

    let alerts = high_risk_alerts(result, min_confidence);
    debug!(alerts = alerts.len(), notifiers = notifiers.len(), "dispatching alerts");
    for notifier in notifiers {
        for alert in &alerts {
            match notifier.notify(alert) {
                Ok(()) => report.notified += 1,
                Err(e) => report.record(notifier.id(), e),
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Analyzer;
    use crate::config::AnalyzerConfig;

    fn make_reading(
        timestamp: i64,
        temperature: f64,
        vibration: f64,
        pressure: f64,
    ) -> SensorReading {
        SensorReading {
            timestamp,
            temperature,
            vibration,
            pressure,
        }
    }

    fn sample_result() -> AnalysisResult {
        let readings = vec![
            make_reading(0, 20.0, 0.01, 1000.0),
            make_reading(30, 90.0, 0.01, 1000.0),
            make_reading(60, 20.0, 0.09, 1020.0),
            make_reading(120, 95.0, 0.01, 1000.0),
        ];
        Analyzer::new(AnalyzerConfig::seeded(5)).analyze_readings(&readings)
    }

    #[test]
    fn only_confident_high_severity_causes_become_alerts() {
        let result = sample_result();
        let alerts = high_risk_alerts(&result, 0.75);
        assert_eq!(alerts.len(), 2);
        assert!(alerts.iter().all(|a| a.metric == Metric::Temperature));
        assert_eq!(alerts[0].confidence, 0.75);
        assert_eq!(alerts[0].reading, Some(make_reading(30, 90.0, 0.01, 1000.0)));
        assert_eq!(alerts[1].reading.map(|r| r.timestamp), Some(120));

        assert!(high_risk_alerts(&result, 0.8).is_empty());
    }

    #[test]
    fn failures_are_reported_not_raised() {
        let result = sample_result();
        let mut good = MemorySink::new();
        let mut full = MemorySink::with_capacity_limit(1);
        let notifier = MemoryNotifier::new();

        let mut sinks: [&mut dyn AnomalySink; 2] = [&mut good, &mut full];
        let notifiers: [&dyn AlertNotifier; 1] = [&notifier];
        let report = dispatch(&result, &mut sinks, &notifiers, 0.75);

        assert_eq!(report.stored, 1);
        assert_eq!(report.notified, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].collaborator, "memory");
        assert!(!report.is_clean());
        assert_eq!(good.insights(), result.insights.as_slice());
        assert!(full.insights().is_empty());
        assert_eq!(notifier.alerts().len(), 2);
    }

    #[test]
    fn error_display() {
        let e = SinkError::Rejected("full".into());
        assert_eq!(e.to_string(), "rejected: full");
        let io = SinkError::from(std::io::Error::other("disk"));
        assert!(io.to_string().starts_with("I/O error"));
        assert!(std::error::Error::source(&io).is_some());
    }
}
