//! Timestamp parser for sensor readings and CLI range arguments.
//!
//! Supports multiple formats:
//! - RFC 3339: `2024-05-01T10:15:30Z`, `2024-05-01T10:15:30+02:00`
//! - ISO 8601 without zone (UTC): `2024-05-01T10:15:30`, `2024-05-01T10:15`
//! - Space separated (UTC): `2024-05-01 10:15:30`, `2024-05-01 10:15`
//! - Date+time (UTC): `2024-05-01:10:15` or `2024-05-01:10:15:30`
//! - Unix timestamp: `1714558530`
//!
//! `parse_time_with_base` additionally accepts relative expressions
//! (`-1h`, `-30m`, `-2d`, `-1w`) measured from a caller-supplied base.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Error type for time parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeParseError {
    pub input: String,
    pub message: String,
}

impl std::fmt::Display for TimeParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse time '{}': {}", self.input, self.message)
    }
}

impl std::error::Error for TimeParseError {}

const FORMATS_HINT: &str = "Unrecognized format. Use: RFC 3339 (2024-05-01T10:15:30Z), \
                            ISO 8601 (2024-05-01T10:15:30), 2024-05-01 10:15:30, \
                            date:time (2024-05-01:10:15), or Unix timestamp (1714558530)";

/// Parse an absolute timestamp into Unix seconds (UTC).
///
/// # Examples
///
/// ```
/// use pulsewatch_core::util::parse_timestamp;
///
/// assert_eq!(parse_timestamp("1970-01-01T00:01:00Z").unwrap(), 60);
/// assert_eq!(parse_timestamp("60").unwrap(), 60);
/// ```
pub fn parse_timestamp(input: &str) -> Result<i64, TimeParseError> {
    let input = input.trim();

    if let Some(ts) = try_parse_unix_timestamp(input) {
        return Ok(ts);
    }

    if let Some(ts) = try_parse_iso8601(input) {
        return Ok(ts);
    }

    if let Some(ts) = try_parse_space_separated(input) {
        return Ok(ts);
    }

    if let Some(ts) = try_parse_date_colon_time(input) {
        return Ok(ts);
    }

    Err(TimeParseError {
        input: input.to_string(),
        message: FORMATS_HINT.to_string(),
    })
}

/// Parses a time expression in UTC using `base_ts` as a reference.
///
/// Absolute formats behave like `parse_timestamp()`. Relative expressions
/// (`-1h`, `-30m`, ...) are subtracted from `base_ts`.
pub fn parse_time_with_base(input: &str, base_ts: i64) -> Result<i64, TimeParseError> {
    let input = input.trim();

    if let Some(delta_secs) = try_parse_relative_delta_seconds(input) {
        return base_ts.checked_add(delta_secs).ok_or(TimeParseError {
            input: input.to_string(),
            message: "Relative time overflow".to_string(),
        });
    }

    parse_timestamp(input).map_err(|mut e| {
        e.message = format!("{FORMATS_HINT}, or relative (-1h, -30m, -2d)");
        e
    })
}

/// Truncates a Unix timestamp to minute resolution.
pub fn minute_key(ts: i64) -> i64 {
    ts - ts.rem_euclid(60)
}

/// Truncates a Unix timestamp to hour resolution.
pub fn hour_key(ts: i64) -> i64 {
    ts - ts.rem_euclid(3600)
}

/// Try to parse as Unix timestamp (plain integer).
fn try_parse_unix_timestamp(input: &str) -> Option<i64> {
    if input.chars().all(|c| c.is_ascii_digit()) && !input.is_empty() {
        input.parse::<i64>().ok()
    } else {
        None
    }
}

/// Parses relative expression and returns delta seconds (negative value).
fn try_parse_relative_delta_seconds(input: &str) -> Option<i64> {
    let rest = input.strip_prefix('-')?;
    if rest.is_empty() {
        return None;
    }

    let unit = rest.chars().last()?;
    let number_str = &rest[..rest.len() - unit.len_utf8()];
    if number_str.is_empty() {
        return None;
    }
    let number: i64 = number_str.parse().ok()?;

    let seconds = match unit {
        's' => number,
        'm' => number.checked_mul(60)?,
        'h' => number.checked_mul(3600)?,
        'd' => number.checked_mul(86400)?,
        'w' => number.checked_mul(604800)?,
        _ => return None,
    };

    Some(-seconds)
}

/// Try to parse as ISO 8601 datetime.
fn try_parse_iso8601(input: &str) -> Option<i64> {
    if !input.contains('T') {
        return None;
    }

    // With timezone
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc).timestamp());
    }

    // No timezone, assume UTC
    naive_utc(input, &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"])
}

/// Try to parse as `YYYY-MM-DD HH:MM[:SS]` (UTC).
fn try_parse_space_separated(input: &str) -> Option<i64> {
    if !input.contains(' ') {
        return None;
    }
    naive_utc(input, &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"])
}

fn naive_utc(input: &str, formats: &[&str]) -> Option<i64> {
    formats
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .map(|ndt| Utc.from_utc_datetime(&ndt).timestamp())
}

/// Try to parse as date:time format (2024-05-01:10:15 or 2024-05-01:10:15:30).
fn try_parse_date_colon_time(input: &str) -> Option<i64> {
    if !input.contains('-') || input.len() < 11 || !input.is_char_boundary(10) {
        return None;
    }

    let date_part = &input[..10];
    if !input[10..].starts_with(':') {
        return None;
    }

    let time_part = &input[11..];

    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;

    let time = if time_part.len() == 5 {
        NaiveTime::parse_from_str(time_part, "%H:%M").ok()?
    } else if time_part.len() == 8 {
        NaiveTime::parse_from_str(time_part, "%H:%M:%S").ok()?
    } else {
        return None;
    };

    let datetime = NaiveDateTime::new(date, time);
    Some(Utc.from_utc_datetime(&datetime).timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> i64 {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s)
            .single()
            .unwrap()
            .timestamp()
    }

    #[test]
    fn test_unix_timestamp() {
        assert_eq!(parse_timestamp("1714558530").unwrap(), 1714558530);
        assert_eq!(parse_timestamp("0").unwrap(), 0);
    }

    #[test]
    fn test_rfc3339_with_offset() {
        let expected = utc(2024, 5, 1, 8, 15, 30);
        assert_eq!(parse_timestamp("2024-05-01T08:15:30Z").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2024-05-01T10:15:30+02:00").unwrap(),
            expected
        );
        assert_eq!(
            parse_timestamp("2024-05-01T08:15:30.250Z").unwrap(),
            expected
        );
    }

    #[test]
    fn test_naive_iso8601() {
        let expected = utc(2024, 5, 1, 10, 15, 0);
        assert_eq!(parse_timestamp("2024-05-01T10:15:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-05-01T10:15").unwrap(), expected);
    }

    #[test]
    fn test_space_separated() {
        assert_eq!(
            parse_timestamp("2024-05-01 10:15:30").unwrap(),
            utc(2024, 5, 1, 10, 15, 30)
        );
        assert_eq!(
            parse_timestamp("2024-05-01 10:15").unwrap(),
            utc(2024, 5, 1, 10, 15, 0)
        );
    }

    #[test]
    fn test_date_colon_time() {
        let expected = utc(2024, 5, 1, 17, 0, 0);
        assert_eq!(parse_timestamp("2024-05-01:17:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-05-01:17:00:00").unwrap(), expected);
    }

    #[test]
    fn test_invalid_formats() {
        assert!(parse_timestamp("").is_err());
        assert!(parse_timestamp("invalid").is_err());
        assert!(parse_timestamp("2024-05-01").is_err());
        assert!(parse_timestamp("2024-13-01T10:00:00").is_err());
        assert!(parse_timestamp("-1h").is_err());
        assert!(parse_timestamp("12:34:56:78").is_err());
    }

    #[test]
    fn test_parse_time_with_base_relative() {
        let base = utc(2024, 5, 8, 10, 0, 0);
        assert_eq!(parse_time_with_base("-1h", base).unwrap(), base - 3600);
        assert_eq!(parse_time_with_base("-30m", base).unwrap(), base - 1800);
        assert_eq!(parse_time_with_base("-2d", base).unwrap(), base - 172800);
        assert_eq!(parse_time_with_base("-1w", base).unwrap(), base - 604800);
        assert_eq!(
            parse_time_with_base("2024-05-08T09:00:00Z", base).unwrap(),
            base - 3600
        );
        assert!(parse_time_with_base("-abc", base).is_err());
    }

    #[test]
    fn test_minute_and_hour_keys() {
        let ts = utc(2024, 5, 1, 10, 15, 42);
        assert_eq!(minute_key(ts), utc(2024, 5, 1, 10, 15, 0));
        assert_eq!(hour_key(ts), utc(2024, 5, 1, 10, 0, 0));
        assert_eq!(minute_key(-1), -60);
    }
}
