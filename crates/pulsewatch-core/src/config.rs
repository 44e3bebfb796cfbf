//! Analyzer tuning knobs.

use serde::{Deserialize, Serialize};

use crate::analysis::cluster::kmeans::DEFAULT_MAX_ITER;

/// Default jitter amplitude for confidence scores.
pub const DEFAULT_JITTER_AMPLITUDE: f64 = 0.10;
/// Minimum confidence for a high-severity hypothesis to be sent to notifiers.
pub const DEFAULT_NOTIFY_MIN_CONFIDENCE: f64 = 0.75;

/// Random term added to confidence scores.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum Jitter {
    #[default]
    Disabled,
    /// Reproducible jitter in `[0, amplitude)`.
    Seeded { seed: u64, amplitude: f64 },
    /// Fresh jitter on every run. Results are not reproducible.
    Entropy { amplitude: f64 },
}

impl Jitter {
    /// Same jitter with the amplitude clamped to `0..=1`. A non-finite
    /// amplitude disables the random term.
    pub fn sanitized(self) -> Self {
        match self {
            Jitter::Disabled => Jitter::Disabled,
            Jitter::Seeded { seed, amplitude } => Jitter::Seeded {
                seed,
                amplitude: clamp_ratio(amplitude, 0.0),
            },
            Jitter::Entropy { amplitude } => Jitter::Entropy {
                amplitude: clamp_ratio(amplitude, 0.0),
            },
        }
    }

    pub fn amplitude(&self) -> f64 {
        match self {
            Jitter::Disabled => 0.0,
            Jitter::Seeded { amplitude, .. } | Jitter::Entropy { amplitude } => *amplitude,
        }
    }
}

/// Clamps `value` to `0..=1`, substituting `fallback` for NaN and infinities.
pub fn clamp_ratio(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

/// Configuration for a single [`crate::analysis::Analyzer`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    /// k-means initialization seed. `None` draws one from the OS.
    pub cluster_seed: Option<u64>,
    /// k-means iteration cap. Default: 100.
    pub max_iterations: usize,
    pub confidence_jitter: Jitter,
    /// Replace tiny-sample scores under 20 with 65. Default: on.
    pub anti_alarm_floor: bool,
    pub notify_min_confidence: f64,
    /// Inclusive `(start, end)` window, Unix seconds.
    pub range: Option<(i64, i64)>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            cluster_seed: None,
            max_iterations: DEFAULT_MAX_ITER,
            confidence_jitter: Jitter::Disabled,
            anti_alarm_floor: true,
            notify_min_confidence: DEFAULT_NOTIFY_MIN_CONFIDENCE,
            range: None,
        }
    }
}

impl AnalyzerConfig {
    /// Default configuration with a fixed clustering seed.
    pub fn seeded(seed: u64) -> Self {
        Self::default().with_cluster_seed(Some(seed))
    }

    pub fn with_cluster_seed(mut self, seed: Option<u64>) -> Self {
        self.cluster_seed = seed;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// The amplitude is clamped to `0..=1`; a non-finite one becomes 0.
    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.confidence_jitter = jitter.sanitized();
        self
    }

    pub fn with_anti_alarm_floor(mut self, enabled: bool) -> Self {
        self.anti_alarm_floor = enabled;
        self
    }

    /// Clamped to `0..=1`; a non-finite threshold keeps the default.
    pub fn with_notify_min_confidence(mut self, threshold: f64) -> Self {
        self.notify_min_confidence = clamp_ratio(threshold, DEFAULT_NOTIFY_MIN_CONFIDENCE);
        self
    }

    /// Bounds are swapped if given in reverse order.
    pub fn with_range(mut self, start: i64, end: i64) -> Self {
        self.range = Some((start.min(end), start.max(end)));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = AnalyzerConfig::default();
        assert_eq!(cfg.cluster_seed, None);
        assert_eq!(cfg.max_iterations, 100);
        assert_eq!(cfg.confidence_jitter, Jitter::Disabled);
        assert!(cfg.anti_alarm_floor);
        assert_eq!(cfg.notify_min_confidence, 0.75);
        assert_eq!(cfg.range, None);
    }

    #[test]
    fn builder_chain() {
        let cfg = AnalyzerConfig::seeded(7)
            .with_max_iterations(0)
            .with_jitter(Jitter::Seeded {
                seed: 3,
                amplitude: DEFAULT_JITTER_AMPLITUDE,
            })
            .with_anti_alarm_floor(false)
            .with_range(200, 100);
        assert_eq!(cfg.cluster_seed, Some(7));
        assert_eq!(cfg.max_iterations, 1);
        assert!(!cfg.anti_alarm_floor);
        assert_eq!(cfg.range, Some((100, 200)));
    }

    #[test]
    fn out_of_range_ratios_are_tamed() {
        let cfg = AnalyzerConfig::default()
            .with_jitter(Jitter::Entropy { amplitude: f64::NAN })
            .with_notify_min_confidence(f64::INFINITY);
        assert_eq!(cfg.confidence_jitter, Jitter::Entropy { amplitude: 0.0 });
        assert_eq!(cfg.notify_min_confidence, DEFAULT_NOTIFY_MIN_CONFIDENCE);

        let cfg = AnalyzerConfig::default()
            .with_jitter(Jitter::Seeded {
                seed: 1,
                amplitude: -0.5,
            })
            .with_notify_min_confidence(1.5);
        assert_eq!(cfg.confidence_jitter.amplitude(), 0.0);
        assert_eq!(cfg.notify_min_confidence, 1.0);

        assert_eq!(Jitter::Entropy { amplitude: 7.0 }.sanitized().amplitude(), 1.0);
    }
}
