//! Confidence scoring for root-cause hypotheses.
//!
//! `confidence = min(1, base(severity) + boost(metric) + jitter)`, rounded to
//! two decimals. Jitter is off unless configured; when configured without a
//! seed the output is non-deterministic and the analyzer reports it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::analysis::{Metric, RootCauseEntry, ScoredRootCause, Severity};
use crate::config::Jitter;

pub fn base_confidence(severity: Severity) -> f64 {
    match severity {
        Severity::High => 0.7,
        Severity::Medium => 0.5,
        Severity::Low => 0.3,
    }
}

pub fn metric_boost(metric: Metric) -> f64 {
    match metric {
        Metric::Temperature => 0.05,
        Metric::Vibration => 0.03,
        Metric::Pressure => 0.02,
        Metric::Unknown => 0.0,
    }
}

pub struct ConfidenceScorer {
    rng: Option<StdRng>,
    amplitude: f64,
    seeded: bool,
}

impl ConfidenceScorer {
    /// Amplitudes outside `0..=1` are clamped; non-finite ones disable jitter.
    pub fn new(jitter: Jitter) -> Self {
        match jitter.sanitized() {
            Jitter::Disabled => Self {
                rng: None,
                amplitude: 0.0,
                seeded: true,
            },
            Jitter::Seeded { seed, amplitude } => Self {
                rng: Some(StdRng::seed_from_u64(seed)),
                amplitude,
                seeded: true,
            },
            Jitter::Entropy { amplitude } => Self {
                rng: Some(StdRng::seed_from_u64(rand::random())),
                amplitude,
                seeded: false,
            },
        }
    }

    /// False when scores depend on an unseeded random source.
    pub fn is_deterministic(&self) -> bool {
        self.seeded
    }

    pub fn score(&mut self, entries: &[RootCauseEntry]) -> Vec<ScoredRootCause> {
        entries
            .iter()
            .map(|entry| {
                let jitter = match self.rng.as_mut() {
                    Some(rng) => rng.random::<f64>() * self.amplitude,
                    None => 0.0,
                };
                let raw = base_confidence(entry.severity) + metric_boost(entry.metric) + jitter;
                ScoredRootCause {
                    entry: entry.clone(),
                    confidence: round2(raw.clamp(0.0, 1.0)),
                }
            })
            .collect()
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
