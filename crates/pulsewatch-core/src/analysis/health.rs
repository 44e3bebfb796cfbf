//! Health score: 100 minus severity density.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::analysis::{AnomalyInsight, Severity};

/// Floor applied to tiny, frightening samples.
pub const ANTI_ALARM_SCORE: u8 = 65;
/// Samples with at most this much total severity weight count as "tiny".
const ANTI_ALARM_MAX_WEIGHT: u32 = 3;
const ANTI_ALARM_RAW_BELOW: f64 = 20.0;
/// Fewer distinct timestamps than this marks the score as low-sample.
pub const LOW_SAMPLE_TIMESTAMPS: usize = 5;

/// How the health score was derived.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthBreakdown {
    /// Unclamped score before the anti-alarm floor.
    pub raw: f64,
    pub total_weight: u32,
    pub distinct_timestamps: usize,
    /// The tiny-sample floor replaced the raw score.
    pub floor_applied: bool,
    /// Too few distinct timestamps for the score to be meaningful.
    pub low_sample: bool,
}

/// Compute health score (0..100) from anomaly severity density.
///
/// `raw = 100 - total_weight / (distinct_timestamps * 3) * 100`.
/// With `anti_alarm_floor`, a raw score under 20 built from total weight ≤ 3
/// is replaced by 65; the breakdown records when that happened.
pub fn compute_health_score(
    insights: &[AnomalyInsight],
    anti_alarm_floor: bool,
) -> (u8, HealthBreakdown) {
    if insights.is_empty() {
        return (
            100,
            HealthBreakdown {
                raw: 100.0,
                ..Default::default()
            },
        );
    }

    let total_weight: u32 = insights.iter().map(|i| i.severity.weight()).sum();
    let distinct_timestamps = insights.iter().map(|i| i.time).collect::<HashSet<_>>().len();
    let max_possible = (distinct_timestamps as u32 * Severity::High.weight()) as f64;
    let raw = 100.0 - (total_weight as f64 / max_possible) * 100.0;

    let floor_applied =
        anti_alarm_floor && total_weight <= ANTI_ALARM_MAX_WEIGHT && raw < ANTI_ALARM_RAW_BELOW;
    let score = if floor_applied {
        ANTI_ALARM_SCORE
    } else {
        raw.round().clamp(0.0, 100.0) as u8
    };

    (
        score,
        HealthBreakdown {
            raw,
            total_weight,
            distinct_timestamps,
            floor_applied,
            low_sample: distinct_timestamps < LOW_SAMPLE_TIMESTAMPS,
        },
    )
}
