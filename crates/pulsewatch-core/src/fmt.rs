//! Shared formatting helpers for reports.
//!
//! Pure string formatting only. Functions that differ between compact table
//! columns and verbose summaries are parameterized via [`FmtStyle`].

use chrono::DateTime;

/// Controls compact (table columns) vs verbose (summary lines) output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FmtStyle {
    /// Compact: `"05-01 10:15"`, `"3m5s"`
    Compact,
    /// Detail: `"2024-05-01 10:15:30 UTC"`, `"3m 5s"`
    Detail,
}

// ---------------------------------------------------------------------------
// Style-parameterized functions
// ---------------------------------------------------------------------------

/// Format a Unix timestamp in UTC, or `"-"` when out of range.
pub fn format_timestamp(ts: i64, style: FmtStyle) -> String {
    let Some(dt) = DateTime::from_timestamp(ts, 0) else {
        return "-".to_string();
    };
    match style {
        FmtStyle::Compact => dt.format("%m-%d %H:%M").to_string(),
        FmtStyle::Detail => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    }
}

/// Format duration in seconds as human-readable.
///
/// Compact: `"3m5s"` (no spaces, `"-"` for negative)
/// Detail:  `"3m 5s"` (with spaces, `"0s"` for `<= 0`)
pub fn format_duration(secs: i64, style: FmtStyle) -> String {
    let sep = match style {
        FmtStyle::Compact => {
            if secs < 0 {
                return "-".to_string();
            }
            ""
        }
        FmtStyle::Detail => {
            if secs <= 0 {
                return "0s".to_string();
            }
            " "
        }
    };
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m{}{}s", secs / 60, sep, secs % 60)
    } else if secs < 86400 {
        format!("{}h{}{}m", secs / 3600, sep, (secs % 3600) / 60)
    } else {
        format!("{}d{}{}h", secs / 86400, sep, (secs % 86400) / 3600)
    }
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

/// Format a 0..=1 ratio as a whole percentage: `0.75` -> `"75%"`.
pub fn format_confidence(ratio: f64) -> String {
    format!("{:.0}%", ratio * 100.0)
}

/// Format a health score with its scale and a low-sample marker.
pub fn format_health(score: u8, low_sample: bool) -> String {
    if low_sample {
        format!("{}/100 (low sample)", score)
    } else {
        format!("{}/100", score)
    }
}

/// Format a priority score with two decimals.
pub fn format_score(score: f64) -> String {
    format!("{:.2}", score)
}
