//! Utility modules for pulsewatch.

mod time_parser;

pub use time_parser::{TimeParseError, hour_key, minute_key, parse_time_with_base, parse_timestamp};
