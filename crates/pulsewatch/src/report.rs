//! Plain-text summary of an analysis result.

use std::collections::BTreeSet;
use std::fmt::Write;

use pulsewatch_core::AnalysisResult;
use pulsewatch_core::fmt::{
    FmtStyle, format_confidence, format_duration, format_health, format_score, format_timestamp,
};

/// Max rows printed in the insight table.
const MAX_INSIGHT_ROWS: usize = 20;

pub fn render(result: &AnalysisResult) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, result);
    out
}

fn write_report(out: &mut String, result: &AnalysisResult) -> std::fmt::Result {
    writeln!(out, "Readings analyzed: {}", result.readings_analyzed)?;
    if !result.input_errors.is_empty() {
        writeln!(out, "Rejected readings: {}", result.input_errors.len())?;
        for e in &result.input_errors {
            writeln!(out, "  {}", e)?;
        }
    }
    if let (Some(first), Some(last)) = (result.heatmap.first(), result.heatmap.last()) {
        writeln!(
            out,
            "Window: {} + {}",
            format_timestamp(first.hour, FmtStyle::Detail),
            format_duration(last.hour - first.hour + 3600, FmtStyle::Detail)
        )?;
    }
    writeln!(out, "Health: {}", format_health(result.health_score, result.health.low_sample))?;
    if result.health.floor_applied {
        writeln!(out, "  (tiny sample, raw score {:.1} replaced by floor)", result.health.raw)?;
    }

    if result.is_quiet() {
        writeln!(out, "No anomalies detected.")?;
        return Ok(());
    }

    writeln!(out)?;
    writeln!(out, "Alert priority:")?;
    for (rank, alert) in result.alert_scores.iter().enumerate() {
        writeln!(
            out,
            "  {}. {:<12} score {:>7}  (weight {}, count {}, impact {})",
            rank + 1,
            alert.metric.as_str(),
            format_score(alert.final_score),
            alert.severity_weight,
            alert.frequency,
            format_score(alert.impact_score)
        )?;
    }

    writeln!(out)?;
    writeln!(out, "Insights ({}):", result.insights.len())?;
    for (insight, scored) in result
        .insights
        .iter()
        .zip(&result.scored_root_causes)
        .take(MAX_INSIGHT_ROWS)
    {
        writeln!(
            out,
            "  {}  {:<12} {:<6} {:>4}  {}",
            format_timestamp(insight.time, FmtStyle::Compact),
            insight.metric.as_str(),
            insight.severity.as_str(),
            format_confidence(scored.confidence),
            scored.entry.root_cause
        )?;
    }
    if result.insights.len() > MAX_INSIGHT_ROWS {
        writeln!(out, "  ... {} more", result.insights.len() - MAX_INSIGHT_ROWS)?;
    }

    let suggestions: BTreeSet<&str> = result
        .suggested_actions
        .iter()
        .map(|a| a.suggestion.as_str())
        .collect();
    if !suggestions.is_empty() {
        writeln!(out)?;
        writeln!(out, "Suggested actions:")?;
        for s in suggestions {
            writeln!(out, "  - {}", s)?;
        }
    }

    for w in &result.warnings {
        writeln!(out, "warning: {}: {}", w.stage, w.reason)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulsewatch_core::reading::SensorReading;
    use pulsewatch_core::{Analyzer, AnalyzerConfig};

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

    #[test]
    fn quiet_report() {
        let result = Analyzer::default().analyze_readings(&[make_reading(0, 20.0, 0.01, 1000.0)]);
        let text = render(&result);
        assert!(text.contains("Health: 100/100\n"));
        assert!(text.contains("No anomalies detected."));
    }

    #[test]
    fn ranks_and_suggestions_are_listed() {
        let readings = vec![
            make_reading(1_714_557_600, 90.0, 0.05, 1000.0),
            make_reading(1_714_557_660, 70.0, 0.08, 1020.0),
        ];
        let result = Analyzer::new(AnalyzerConfig::seeded(1)).analyze_readings(&readings);
        let text = render(&result);
        assert!(text.contains("1. Temperature"));
        assert!(text.contains("3. Pressure"));
        assert!(text.contains("05-01 10:00  Temperature  High    75%"));
        assert!(text.contains("  - Check cooling systems and fans."));
        assert!(!text.contains("warning:"));
    }
}
