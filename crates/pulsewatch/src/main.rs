//! pulsewatch - anomaly analysis for multi-sensor equipment telemetry.
//!
//! Reads a JSON array of readings (`timestamp`, `temperature`, `vibration`,
//! `pressure`) from a file or stdin, runs the analysis pipeline and prints a
//! text summary or the full result as JSON. Insights can be appended to a
//! JSON-lines file and high-risk alerts reported to the log.

mod report;
mod sink;

use std::io::Read;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{Level, debug, error, info};
use tracing_subscriber::EnvFilter;

use pulsewatch_core::config::DEFAULT_JITTER_AMPLITUDE;
use pulsewatch_core::reading::{RawReading, validate};
use pulsewatch_core::sink::{AlertNotifier, AnomalySink};
use pulsewatch_core::util::{TimeParseError, parse_time_with_base};
use pulsewatch_core::{Analyzer, AnalyzerConfig, Jitter};

use sink::{JsonLinesSink, LogNotifier};

// ============================================================
// CLI
// ============================================================

#[derive(Parser)]
#[command(
    name = "pulsewatch",
    about = "Sensor anomaly analysis",
    version = pulsewatch_core::VERSION
)]
struct Args {
    /// JSON file with an array of readings. Reads stdin when omitted or "-".
    input: Option<PathBuf>,

    /// Print the full analysis result as JSON instead of a text summary.
    #[arg(long)]
    json: bool,

    /// Pretty-print JSON output.
    #[arg(long, requires = "json")]
    pretty: bool,

    /// Seed for k-means initialization. Without it cluster ids may vary between runs.
    #[arg(long, env = "PULSEWATCH_SEED")]
    seed: Option<u64>,

    /// k-means iteration cap.
    #[arg(long, default_value = "100", env = "PULSEWATCH_MAX_ITERATIONS")]
    max_iterations: usize,

    /// Add seeded jitter to confidence scores.
    #[arg(long, env = "PULSEWATCH_JITTER_SEED", conflicts_with = "jitter_entropy")]
    jitter_seed: Option<u64>,

    /// Add unseeded jitter to confidence scores (non-reproducible).
    #[arg(long)]
    jitter_entropy: bool,

    /// Upper bound of the confidence jitter, between 0 and 1.
    #[arg(
        long,
        default_value_t = DEFAULT_JITTER_AMPLITUDE,
        value_parser = parse_ratio,
        env = "PULSEWATCH_JITTER_AMPLITUDE"
    )]
    jitter_amplitude: f64,

    /// Report the raw health score even for tiny samples.
    #[arg(long, env = "PULSEWATCH_NO_HEALTH_FLOOR")]
    no_health_floor: bool,

    /// Start of the analysis window. Absolute time or relative to the newest
    /// reading (e.g. "-1h", "-2d").
    #[arg(short, long)]
    begin: Option<String>,

    /// End of the analysis window. Same formats as --begin.
    #[arg(short, long)]
    end: Option<String>,

    /// Append detected insights to this JSON-lines file.
    #[arg(long, env = "PULSEWATCH_SINK_PATH")]
    sink_path: Option<PathBuf>,

    /// Log a warning for every high-risk alert.
    #[arg(long, env = "PULSEWATCH_NOTIFY")]
    notify: bool,

    /// Minimum confidence for a high-severity cause to be reported, between 0 and 1.
    #[arg(
        long,
        default_value = "0.75",
        value_parser = parse_ratio,
        env = "PULSEWATCH_NOTIFY_MIN_CONFIDENCE"
    )]
    notify_min_confidence: f64,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Parses a ratio in `0..=1`. Rejects NaN and infinities.
fn parse_ratio(s: &str) -> Result<f64, String> {
    let value = s
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid ratio '{}': {}", s, e))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("ratio '{}' must be between 0 and 1", s));
    }
    Ok(value)
}

// ============================================================
// Errors
// ============================================================

#[derive(Debug)]
enum CliError {
    Read { source: String, error: std::io::Error },
    Json(serde_json::Error),
    Time(TimeParseError),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Read { source, error } => write!(f, "failed to read {}: {}", source, error),
            CliError::Json(e) => write!(f, "invalid JSON: {}", e),
            CliError::Time(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}

impl From<TimeParseError> for CliError {
    fn from(e: TimeParseError) -> Self {
        CliError::Time(e)
    }
}

// ============================================================
// Main
// ============================================================

/// Initializes the tracing subscriber on stderr so stdout stays machine-readable.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["pulsewatch", "pulsewatch_core"] {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    if let Err(e) = run(&args) {
        error!("{}", e);
        eprintln!("pulsewatch: {}", e);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    let input = read_input(args.input.as_ref())?;
    let raw: Vec<RawReading> = serde_json::from_str(&input)?;
    info!(version = pulsewatch_core::VERSION, readings = raw.len(), "loaded input");

    let mut config = AnalyzerConfig::default()
        .with_cluster_seed(args.seed)
        .with_max_iterations(args.max_iterations)
        .with_jitter(jitter_from_args(args))
        .with_anti_alarm_floor(!args.no_health_floor)
        .with_notify_min_confidence(args.notify_min_confidence);
    if let Some((start, end)) = resolve_range(&raw, args.begin.as_deref(), args.end.as_deref())? {
        config = config.with_range(start, end);
    }

    let analyzer = Analyzer::new(config);
    let result = analyzer.analyze(&raw);

    let mut json_sink = args.sink_path.as_ref().map(JsonLinesSink::new);
    let mut sinks: Vec<&mut dyn AnomalySink> = Vec::new();
    if let Some(s) = json_sink.as_mut() {
        sinks.push(s);
    }
    let mut notifiers: Vec<&dyn AlertNotifier> = Vec::new();
    if args.notify {
        notifiers.push(&LogNotifier);
    }
    if !sinks.is_empty() || !notifiers.is_empty() {
        let dispatched = analyzer.dispatch(&result, &mut sinks, &notifiers);
        debug!(
            stored = dispatched.stored,
            notified = dispatched.notified,
            failures = dispatched.failures.len(),
            "dispatch finished"
        );
        if let Some(s) = json_sink.as_ref() && dispatched.stored > 0 {
            info!(path = %s.path().display(), stored = dispatched.stored, "insights appended");
        }
    }

    if args.json {
        println!("{}", result.to_json(args.pretty)?);
    } else {
        print!("{}", report::render(&result));
    }
    Ok(())
}

fn read_input(path: Option<&PathBuf>) -> Result<String, CliError> {
    match path {
        Some(p) if p.as_os_str() != "-" => {
            std::fs::read_to_string(p).map_err(|error| CliError::Read {
                source: p.display().to_string(),
                error,
            })
        }
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|error| CliError::Read {
                    source: "stdin".to_string(),
                    error,
                })?;
            Ok(buf)
        }
    }
}

fn jitter_from_args(args: &Args) -> Jitter {
    match (args.jitter_seed, args.jitter_entropy) {
        (Some(seed), _) => Jitter::Seeded {
            seed,
            amplitude: args.jitter_amplitude,
        },
        (None, true) => Jitter::Entropy {
            amplitude: args.jitter_amplitude,
        },
        (None, false) => Jitter::Disabled,
    }
}

/// Resolves --begin/--end against the newest valid reading. A missing bound
/// leaves that side of the window open.
fn resolve_range(
    raw: &[RawReading],
    begin: Option<&str>,
    end: Option<&str>,
) -> Result<Option<(i64, i64)>, CliError> {
    if begin.is_none() && end.is_none() {
        return Ok(None);
    }
    let base = validate(raw)
        .readings
        .iter()
        .map(|r| r.reading.timestamp)
        .max()
        .unwrap_or(0);
    let start = begin
        .map(|s| parse_time_with_base(s, base))
        .transpose()?
        .unwrap_or(i64::MIN);
    let end = end
        .map(|s| parse_time_with_base(s, base))
        .transpose()?
        .unwrap_or(i64::MAX);
    debug!(start, end, base, "resolved analysis window");
    Ok(Some((start, end)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch() -> Vec<RawReading> {
        vec![
            RawReading::new("2024-05-01T10:00:00Z", 90.0, 0.05, 1000.0),
            RawReading::new("2024-05-01T12:00:00Z", 70.0, 0.08, 1020.0),
        ]
    }

    #[test]
    fn no_bounds_no_range() {
        assert_eq!(resolve_range(&batch(), None, None).unwrap(), None);
    }

    #[test]
    fn relative_begin_is_measured_from_newest_reading() {
        let newest = 1_714_557_600 + 2 * 3600;
        let range = resolve_range(&batch(), Some("-1h"), None).unwrap();
        assert_eq!(range, Some((newest - 3600, i64::MAX)));
    }

    #[test]
    fn absolute_end() {
        let range = resolve_range(&batch(), None, Some("2024-05-01 11:00")).unwrap();
        assert_eq!(range, Some((i64::MIN, 1_714_557_600 + 3600)));
    }

    #[test]
    fn bad_bound_is_an_error() {
        let err = resolve_range(&batch(), Some("soon"), None).unwrap_err();
        assert!(matches!(err, CliError::Time(_)));
    }

    #[test]
    fn args_map_to_jitter() {
        let args = Args::parse_from(["pulsewatch", "--jitter-seed", "4"]);
        assert_eq!(
            jitter_from_args(&args),
            Jitter::Seeded {
                seed: 4,
                amplitude: DEFAULT_JITTER_AMPLITUDE
            }
        );
        let args =
            Args::parse_from(["pulsewatch", "--jitter-entropy", "--jitter-amplitude", "0.2"]);
        assert_eq!(jitter_from_args(&args), Jitter::Entropy { amplitude: 0.2 });
        let args = Args::parse_from(["pulsewatch"]);
        assert_eq!(jitter_from_args(&args), Jitter::Disabled);
    }

    #[test]
    fn reads_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readings.json");
        std::fs::write(
            &path,
            r#"[
                {"timestamp":"2024-05-01 10:00","temperature":90,"vibration":0.05,"pressure":1000},
                {"timestamp":1714557660,"temperature":70.0,"vibration":0.08,"pressure":1020.0}
            ]"#,
        )
        .unwrap();
        let input = read_input(Some(&path)).unwrap();
        let raw: Vec<RawReading> = serde_json::from_str(&input).unwrap();
        assert_eq!(raw.len(), 2);
        let result = Analyzer::new(AnalyzerConfig::seeded(1)).analyze(&raw);
        assert_eq!(result.insights.len(), 3);

        let missing = read_input(Some(&dir.path().join("missing.json"))).unwrap_err();
        assert!(missing.to_string().starts_with("failed to read"));
    }

    #[test]
    fn ratios_outside_unit_interval_are_rejected() {
        assert_eq!(parse_ratio(" 0.25 "), Ok(0.25));
        for bad in ["NaN", "inf", "-0.1", "1.5", "lots"] {
            assert!(parse_ratio(bad).is_err(), "{bad}");
        }
        assert!(Args::try_parse_from(["pulsewatch", "--jitter-amplitude", "NaN"]).is_err());
        assert!(Args::try_parse_from(["pulsewatch", "--notify-min-confidence", "inf"]).is_err());
        let args = Args::try_parse_from(["pulsewatch", "--notify-min-confidence", "0.9"]).unwrap();
        assert_eq!(args.notify_min_confidence, 0.9);
    }

    #[test]
    fn one_bad_row_in_a_file_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readings.json");
        std::fs::write(
            &path,
            r#"[
                {"timestamp":"2024-05-01 10:00","temperature":90,"vibration":0.01,"pressure":1000},
                {"timestamp":1714557660.0,"temperature":null,"vibration":0.05,"pressure":1000.0},
                {"timestamp":1714557720,"temperature":70.0,"vibration":"0.08","pressure":1020.0}
            ]"#,
        )
        .unwrap();
        let input = read_input(Some(&path)).unwrap();
        let raw: Vec<RawReading> = serde_json::from_str(&input).unwrap();
        let result = Analyzer::new(AnalyzerConfig::seeded(1)).analyze(&raw);
        assert_eq!(result.input_errors.len(), 1);
        assert_eq!(result.input_errors[0].index, 1);
        assert_eq!(result.readings_analyzed, 2);
        assert_eq!(result.insights.len(), 3);

        let range = resolve_range(&raw, Some("-1m"), None).unwrap();
        assert_eq!(range, Some((1_714_557_660, i64::MAX)));
    }
}
