//! pulsewatch-core: anomaly analysis and prioritization for multi-sensor
//! equipment telemetry.
//!
//! Provides:
//! - `reading`: raw reading validation, range filtering, content fingerprint
//! - `analysis`: threshold detection, impact, root causes, confidence,
//!   clustering, alert ranking, health score and the [`analysis::Analyzer`]
//!   that runs them in order
//! - `config`: analyzer tuning ([`config::AnalyzerConfig`])
//! - `sink`: anomaly sink / alert notifier traits and `dispatch`
//! - `fmt`: shared formatting helpers
//! - `util`: timestamp parsing and bucketing
//!
//! With `json` feature:
//! - `AnalysisResult::to_json` / `from_json`

pub mod analysis;
pub mod config;
pub mod fmt;
pub mod reading;
pub mod sink;
pub mod util;

pub use analysis::{AnalysisResult, Analyzer};
pub use config::{AnalyzerConfig, Jitter};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
