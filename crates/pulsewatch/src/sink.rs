//! File-backed anomaly sink and log-backed alert notifier.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use pulsewatch_core::analysis::AnomalyInsight;
use pulsewatch_core::fmt::{FmtStyle, format_confidence, format_timestamp};
use pulsewatch_core::sink::{AlertNotifier, AnomalySink, HighRiskAlert, SinkError};

/// Appends every stored insight as one JSON object per line.
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AnomalySink for JsonLinesSink {
    fn id(&self) -> &'static str {
        "jsonl"
    }

    fn store(&mut self, insights: &[AnomalyInsight]) -> Result<(), SinkError> {
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut writer = BufWriter::new(file);
        for insight in insights {
            serde_json::to_writer(&mut writer, insight).map_err(|e| SinkError::Io(e.into()))?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        debug!(path = %self.path.display(), count = insights.len(), "stored insights");
        Ok(())
    }
}

/// Reports each high-risk alert as a warning log line.
pub struct LogNotifier;

impl AlertNotifier for LogNotifier {
    fn id(&self) -> &'static str {
        "log"
    }

    fn notify(&self, alert: &HighRiskAlert) -> Result<(), SinkError> {
        match &alert.reading {
            Some(r) => warn!(
                time = %format_timestamp(r.timestamp, FmtStyle::Detail),
                metric = %alert.metric,
                severity = %alert.severity,
                confidence = %format_confidence(alert.confidence),
                temperature = r.temperature,
                vibration = r.vibration,
                pressure = r.pressure,
                "high-risk anomaly: {}",
                alert.root_cause
            ),
            None => warn!(
                time = %format_timestamp(alert.time, FmtStyle::Detail),
                metric = %alert.metric,
                severity = %alert.severity,
                confidence = %format_confidence(alert.confidence),
                "high-risk anomaly: {}",
                alert.root_cause
            ),
        }
        Ok(())
    }
}
