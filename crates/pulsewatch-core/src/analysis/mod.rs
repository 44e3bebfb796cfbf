pub mod advisor;
pub mod cluster;
pub mod confidence;
pub mod detector;
pub mod frequency;
pub mod health;
pub mod heatmap;
pub mod impact;
pub mod priority;
pub mod root_cause;
pub mod rules;
pub mod trends;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{AnalyzerConfig, DEFAULT_NOTIFY_MIN_CONFIDENCE, clamp_ratio};
use crate::reading::{
    InputError, RawReading, SensorReading, Validation, filter_range, fingerprint, validate,
    validate_typed,
};
use crate::sink::{AlertNotifier, AnomalySink, DispatchReport, dispatch};

use advisor::SuggestedAction;
use confidence::ConfidenceScorer;
use health::HealthBreakdown;
use heatmap::HeatmapCell;
use trends::WeeklyTrends;

// ============================================================
// Core types
// ============================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    Temperature,
    Vibration,
    Pressure,
    /// Any metric name this build does not know. Only reachable through
    /// deserialized data.
    #[serde(other)]
    Unknown,
}

impl Metric {
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Temperature => "Temperature",
            Metric::Vibration => "Vibration",
            Metric::Pressure => "Pressure",
            Metric::Unknown => "Unknown",
        }
    }

    /// Fixed risk attached to every breach of this metric, 0..=100.
    pub fn risk_score(self) -> u32 {
        match self {
            Metric::Temperature => 90,
            Metric::Vibration => 75,
            Metric::Pressure => 60,
            Metric::Unknown => 0,
        }
    }

    pub fn impact(self) -> &'static str {
        match self {
            Metric::Temperature => "High energy consumption, possible component wear.",
            Metric::Vibration => "Potential misalignment or bearing failure.",
            Metric::Pressure => "System strain, could lead to leakage or failure.",
            Metric::Unknown => "Unknown impact.",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn weight(self) -> u32 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One threshold breach. `time` is the reading's minute (Unix seconds).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyInsight {
    pub time: i64,
    pub metric: Metric,
    pub severity: Severity,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyFrequency {
    pub metric: Metric,
    pub severity: Severity,
    pub count: usize,
}

/// Business impact of one breach. `time` is the full reading timestamp.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactEntry {
    pub time: i64,
    pub metric: Metric,
    pub impact: String,
    pub risk_score: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootCauseEntry {
    pub time: i64,
    pub metric: Metric,
    pub severity: Severity,
    pub root_cause: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredRootCause {
    #[serde(flatten)]
    pub entry: RootCauseEntry,
    /// 0..=1, two decimals.
    pub confidence: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterPoint {
    pub temperature: f64,
    pub vibration: f64,
    pub pressure: f64,
    pub cluster: usize,
    pub timestamp: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster2DPoint {
    pub x: f64,
    pub y: f64,
    pub cluster: usize,
    pub timestamp: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertScore {
    pub metric: Metric,
    pub severity_weight: u32,
    pub frequency: usize,
    pub impact_score: f64,
    pub final_score: f64,
}

/// A stage whose output depended on an unseeded random source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NonDeterminismWarning {
    pub stage: String,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// xxh3 of the readings that entered detection.
    pub fingerprint: u64,
    pub readings_analyzed: usize,
    pub input_errors: Vec<InputError>,
    pub insights: Vec<AnomalyInsight>,
    pub frequencies: Vec<AnomalyFrequency>,
    pub impacts: Vec<ImpactEntry>,
    pub impact_scores: BTreeMap<Metric, f64>,
    pub root_causes: Vec<RootCauseEntry>,
    pub scored_root_causes: Vec<ScoredRootCause>,
    pub clusters: Vec<ClusterPoint>,
    #[serde(rename = "clusters2d")]
    pub clusters_2d: Vec<Cluster2DPoint>,
    pub alert_scores: Vec<AlertScore>,
    pub health_score: u8,
    pub health: HealthBreakdown,
    pub suggested_actions: Vec<SuggestedAction>,
    pub trends: WeeklyTrends,
    pub heatmap: Vec<HeatmapCell>,
    pub warnings: Vec<NonDeterminismWarning>,
}

impl AnalysisResult {
    /// True when no insight was produced.
    pub fn is_quiet(&self) -> bool {
        self.insights.is_empty()
    }

    /// True when every stage output is reproducible from the input.
    pub fn is_deterministic(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn top_alert(&self) -> Option<&AlertScore> {
        self.alert_scores.first()
    }

    #[cfg(feature = "json")]
    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }

    #[cfg(feature = "json")]
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

// ============================================================
// Analyzer
// ============================================================

pub struct Analyzer {
    rules: Vec<Box<dyn rules::AnalysisRule>>,
    advisors: Vec<Box<dyn advisor::Advisor>>,
    config: AnalyzerConfig,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            rules: rules::all_rules(),
            advisors: advisor::all_advisors(),
            config,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Validates a raw batch and analyzes the valid remainder. Malformed
    /// readings are listed in `input_errors` and otherwise ignored.
    pub fn analyze(&self, raw: &[RawReading]) -> AnalysisResult {
        self.run_validated(validate(raw), raw.len())
    }

    /// Analyzes readings built in code. Readings with non-finite values are
    /// reported in `input_errors` and dropped like malformed raw rows.
    pub fn analyze_readings(&self, readings: &[SensorReading]) -> AnalysisResult {
        self.run_validated(validate_typed(readings), readings.len())
    }

    fn run_validated(&self, validation: Validation, total: usize) -> AnalysisResult {
        if !validation.errors.is_empty() {
            warn!(rejected = validation.errors.len(), total, "rejected malformed readings");
            for e in &validation.errors {
                debug!("{}", e);
            }
        }
        self.run(&validation.sensor_readings(), validation.errors)
    }

    /// Feeds a finished result to sinks and notifiers using the configured
    /// notification threshold.
    pub fn dispatch(
        &self,
        result: &AnalysisResult,
        sinks: &mut [&mut dyn AnomalySink],
        notifiers: &[&dyn AlertNotifier],
    ) -> DispatchReport {
        let min_confidence =
            clamp_ratio(self.config.notify_min_confidence, DEFAULT_NOTIFY_MIN_CONFIDENCE);
        dispatch(result, sinks, notifiers, min_confidence)
    }

    fn run(&self, readings: &[SensorReading], input_errors: Vec<InputError>) -> AnalysisResult {
        let windowed;
        let readings = match self.config.range {
            Some((start, end)) => {
                windowed = filter_range(readings, start, end);
                debug!(start, end, kept = windowed.len(), "applied time range");
                &windowed[..]
            }
            None => readings,
        };

        // Layer 1: detect
        let insights = detector::detect(&self.rules, readings);
        let frequencies = frequency::anomaly_frequency(&insights);

        // Layer 2: impact and causes
        let impacts = impact::compute_impacts(&self.rules, readings);
        let impact_scores = impact::impact_score_per_metric(&impacts);
        let root_causes = root_cause::generate_root_causes(&insights);
        let mut scorer = ConfidenceScorer::new(self.config.confidence_jitter);
        let scored_root_causes = scorer.score(&root_causes);

        // Layer 3: behavioral clusters
        let anomalous = cluster::anomalous_readings(readings, &insights);
        let clusters = cluster::cluster_anomalies(
            &anomalous,
            self.config.cluster_seed,
            self.config.max_iterations,
        );
        let clusters_2d = cluster::project_2d(&clusters);

        // Layer 4: ranking and health
        let alert_scores = priority::prioritize_alerts(&insights, &impact_scores);
        let (health_score, health) =
            health::compute_health_score(&insights, self.config.anti_alarm_floor);
        let suggested_actions = advisor::suggest_actions(&self.advisors, &insights);

        let trends = WeeklyTrends::compute(readings);
        let heatmap = heatmap::hourly_heatmap(&self.rules, readings);

        let mut warnings = Vec::new();
        if self.config.cluster_seed.is_none() && anomalous.len() > cluster::CLUSTER_COUNT {
            warnings.push(NonDeterminismWarning {
                stage: "clustering".to_string(),
                reason: "k-means initialized without a seed; cluster ids may differ between runs"
                    .to_string(),
            });
        }
        if !scorer.is_deterministic() && !root_causes.is_empty() {
            let amplitude = self.config.confidence_jitter.sanitized().amplitude();
            warnings.push(NonDeterminismWarning {
                stage: "confidence".to_string(),
                reason: format!("unseeded jitter of up to {amplitude} added to confidence scores"),
            });
        }
        for w in &warnings {
            warn!(stage = %w.stage, "{}", w.reason);
        }

        debug!(
            readings = readings.len(),
            insights = insights.len(),
            impacts = impacts.len(),
            clustered = clusters.len(),
            "analysis stages complete"
        );
        match alert_scores.first() {
            Some(top) => info!(
                health = health_score,
                top_metric = %top.metric,
                top_score = top.final_score,
                "analysis finished"
            ),
            None => info!(health = health_score, "analysis finished, no anomalies"),
        }

        AnalysisResult {
            fingerprint: fingerprint(readings),
            readings_analyzed: readings.len(),
            input_errors,
            insights,
            frequencies,
            impacts,
            impact_scores,
            root_causes,
            scored_root_causes,
            clusters,
            clusters_2d,
            alert_scores,
            health_score,
            health,
            suggested_actions,
            trends,
            heatmap,
            warnings,
        }
    }
}
