//! The summary document.
//!
//! The summary is wrapped in a single `rsyslog_pstats` key so it can be
//! merged with the output of other tools that produce JSON.

use std::io::Write;

use chrono::NaiveDateTime;
use pstats_capture::timeline::{Stat, Timeline};
use serde::Serialize;
use tracing::info;

use crate::{
    aggregate::{self, AggregatedStats},
    config::Options,
    group::{self, Grouping},
};

/// Key wrapping the whole summary.
pub const REPORT_KEY: &str = "rsyslog_pstats";

/// Errors produced while building or writing a [`Report`]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Grouping the timeline failed
    #[error(transparent)]
    Group(#[from] group::Error),
    /// Aggregating the grouped metrics failed
    #[error(transparent)]
    Aggregate(#[from] aggregate::Error),
    /// Serializing the report failed
    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
    /// Writing the report failed
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// How a report is laid out.
pub enum Style {
    /// Indented, for people
    Pretty,
    /// No extraneous whitespace, for files
    Compact,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
/// Echo of the parsed input.
pub enum OriginalStats<'a> {
    /// One record per observation, each led by its timestamp
    Flattened(Vec<Stat>),
    /// Observations keyed by timestamp
    Grouped(&'a Timeline),
}

#[derive(Debug, Default, Serialize)]
/// Contents of the summary.
pub struct Summary<'a> {
    /// Echo of the input, see [`Options::original_stats`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_stats: Option<OriginalStats<'a>>,
    /// Per source statistics, see [`Options::aggregate_stats`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agg_stats: Option<AggregatedStats>,
    /// First timestamp of the input
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_start: Option<NaiveDateTime>,
    /// Last timestamp of the input
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_end: Option<NaiveDateTime>,
    /// Whole seconds between the first and last timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
/// The summary document.
pub struct Report<'a> {
    /// The summary, under [`REPORT_KEY`]
    pub rsyslog_pstats: Summary<'a>,
}

impl<'a> Report<'a> {
    /// Build the report for `timeline`.
    ///
    /// The timeline is always grouped and aggregated, so structural errors
    /// abort the build whatever is requested. Aggregate statistics are only
    /// included when asked for.
    ///
    /// # Errors
    ///
    /// Returns an error if grouping or aggregation fails.
    pub fn build(timeline: &'a Timeline, options: &Options) -> Result<Self, Error> {
        let mut summary = Summary::default();

        if options.original_stats {
            summary.original_stats = Some(if options.no_flatten {
                OriginalStats::Grouped(timeline)
            } else {
                OriginalStats::Flattened(timeline.flatten())
            });
        }

        let grouping = Grouping::from_timeline(timeline)?;
        let agg_stats = aggregate::aggregate(&grouping, options)?;

        if options.aggregate_stats {
            summary.agg_stats = Some(agg_stats);

            if let (Some(start), Some(end)) = (timeline.first_timestamp(), timeline.last_timestamp())
            {
                summary.timestamp_start = Some(start);
                summary.timestamp_end = Some(end);
                summary.runtime_seconds = Some((end - start).num_seconds());
                info!(
                    "Aggregated {sources} sources from {start} to {end}",
                    sources = grouping.sources.len()
                );
            }
        }

        Ok(Self {
            rsyslog_pstats: summary,
        })
    }

    /// Write the report to `writer` and flush it. Pretty output is followed
    /// by a newline, compact output is not.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W: Write>(&self, mut writer: W, style: Style) -> Result<(), Error> {
        match style {
            Style::Pretty => {
                serde_json::to_writer_pretty(&mut writer, self)?;
                writer.write_all(b"\n")?;
            }
            Style::Compact => serde_json::to_writer(&mut writer, self)?,
        }
        writer.flush()?;
        Ok(())
    }
}
