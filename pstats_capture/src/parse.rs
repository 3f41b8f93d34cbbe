//! Line parser for impstats log files
//!
//! A line looks like
//!
//! ```text
//! Mon Jul  1 15:31:19 2019: @cee: { "name": "imudp(*:10514)", "origin": "imudp", "submitted": 100000 }
//! ```
//!
//! The date header is always 24 characters wide (the day of month is space
//! padded), followed by `: `, an optional `@cee: ` tag and a JSON object
//! running to the end of the line. impstats output is frequently mixed into
//! a shared syslog file, so lines that do not have this shape are skipped
//! with a warning. A line that does have the shape but carries an invalid
//! date or invalid JSON aborts the read.

use std::io::BufRead;

use chrono::{
    NaiveDateTime,
    format::{self, Parsed, StrftimeItems},
};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::timeline::{Stat, Timeline};

/// Width of the date header in characters.
pub const TIMESTAMP_WIDTH: usize = 24;

/// `strftime` form of the date header, day of month space padded.
pub const TIMESTAMP_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Form of the weekday field of a date header.
const WEEKDAY_FORMAT: &str = "%a";

/// Form used to parse a whitespace-normalised date header, weekday removed.
const DATE_PARSE_FORMAT: &str = "%b %d %H:%M:%S %Y";

static LINE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<timestamp>.{24}): (?:@cee: )?(?P<stat>\{.*\})$")
        .expect("Invalid regex pattern provided")
});

/// Errors produced while parsing an impstats stream
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Reading from the source failed
    #[error("Failed to read line {line} of {source_name}: {error}")]
    Io {
        /// 1-based line number
        line: u64,
        /// Name of the input
        source_name: String,
        /// Underlying IO error
        #[source]
        error: std::io::Error,
    },
    /// The date header matched the line pattern but is not a valid date
    #[error("Invalid timestamp {text:?} on line {line} of {source_name}: {error}")]
    Timestamp {
        /// 1-based line number
        line: u64,
        /// Name of the input
        source_name: String,
        /// The date header as found on the line
        text: String,
        /// Underlying chrono error
        #[source]
        error: chrono::ParseError,
    },
    /// The JSON body matched the line pattern but is not a valid JSON object
    #[error("Invalid JSON on line {line} of {source_name}: {error}")]
    Json {
        /// 1-based line number
        line: u64,
        /// Name of the input
        source_name: String,
        /// Underlying serde error
        #[source]
        error: serde_json::Error,
    },
    /// Not a single line of the input had the impstats shape
    #[error("Unable to match any rsyslog pstats in JSON or CEE format from {source_name}")]
    NoStats {
        /// Name of the input
        source_name: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
/// A line that matched the impstats shape.
pub struct Observation {
    /// 1-based line number the observation was read from
    pub line: u64,
    /// The date header
    pub timestamp: NaiveDateTime,
    /// The JSON body
    pub stat: Stat,
}

/// Parse a date header such as `Mon Jul  1 15:31:19 2019`.
///
/// # Errors
///
/// Returns an error if `text` is not a valid date in the impstats header
/// format. The weekday must be a weekday name but is not checked against the
/// date.
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    // The space padding of the day is not significant once fields are
    // separated by exactly one space.
    let normalised = text.split_whitespace().collect::<Vec<&str>>().join(" ");
    let (weekday, date) = normalised
        .split_once(' ')
        .unwrap_or((normalised.as_str(), ""));

    let mut parsed = Parsed::new();
    format::parse(&mut parsed, weekday, StrftimeItems::new(WEEKDAY_FORMAT))?;
    NaiveDateTime::parse_from_str(date, DATE_PARSE_FORMAT)
}

/// Render a timestamp as an impstats date header.
#[must_use]
pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a single line.
///
/// Returns `Ok(None)` when the line does not have the impstats shape. A
/// trailing carriage return is ignored.
///
/// # Errors
///
/// Returns an error if the line has the impstats shape but its date header
/// or JSON body does not parse.
pub fn parse_line(source_name: &str, line: u64, text: &str) -> Result<Option<Observation>, Error> {
    let text = text.strip_suffix('\r').unwrap_or(text);
    let Some(captures) = LINE_PATTERN.captures(text) else {
        return Ok(None);
    };

    let header = &captures["timestamp"];
    let timestamp = parse_timestamp(header).map_err(|error| Error::Timestamp {
        line,
        source_name: source_name.to_string(),
        text: header.to_string(),
        error,
    })?;

    let stat: Stat = serde_json::from_str(&captures["stat"]).map_err(|error| Error::Json {
        line,
        source_name: source_name.to_string(),
        error,
    })?;

    Ok(Some(Observation {
        line,
        timestamp,
        stat,
    }))
}

/// Read every line of `reader` into a [`Timeline`].
///
/// Lines without the impstats shape are skipped with a warning.
///
/// # Errors
///
/// Returns an error if reading fails, if a matching line does not parse, or
/// if no line at all matched.
pub fn read<R: BufRead>(reader: R, source_name: &str) -> Result<Timeline, Error> {
    let mut timeline = Timeline::new();
    let mut line_count: u64 = 0;
    let mut skipped: u64 = 0;

    for text in reader.lines() {
        line_count += 1;
        let text = text.map_err(|error| Error::Io {
            line: line_count,
            source_name: source_name.to_string(),
            error,
        })?;

        match parse_line(source_name, line_count, &text)? {
            Some(observation) => {
                debug!(
                    "Parsed line {line_count} reported at {timestamp}",
                    timestamp = observation.timestamp
                );
                timeline.push(observation.timestamp, observation.stat);
            }
            None => {
                warn!(
                    "Skipped line {line_count} of {source_name} because timestamp and/or JSON pattern did not match."
                );
                skipped += 1;
            }
        }
    }

    if timeline.is_empty() {
        return Err(Error::NoStats {
            source_name: source_name.to_string(),
        });
    }

    info!(
        "Read {line_count} lines from {source_name}: {stats} stats at {timestamps} timestamps, {skipped} skipped",
        stats = timeline.stat_count(),
        timestamps = timeline.len(),
    );
    Ok(timeline)
}
