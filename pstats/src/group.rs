//! Metric grouping
//!
//! impstats reports one object per source (an input, a queue, an action,
//! resource usage) per interval. Aggregation wants the opposite view: for
//! each source, each metric as a series over time. This module builds that
//! view from a [`Timeline`].
//!
//! Dynstats buckets are the exception to the one-key-one-metric rule: their
//! metric names are created at runtime by rsyslog configuration and arrive
//! nested under a `values` object. Those names are flattened into the source
//! like any other metric and recorded in [`Grouping::dynamic_names`], as
//! bucket values are always counters.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use pstats_capture::{
    timeline::{Stat, Timeline},
    value::MetricValue,
};
use serde_json::Value;
use tracing::debug;

/// Origin reported by dynstats bucket objects.
pub const DYNSTATS_BUCKET_ORIGIN: &str = "dynstats.bucket";
/// Key under which a dynstats bucket nests its metrics.
pub const DYNSTATS_VALUES_KEY: &str = "values";
/// Key naming the source of an object.
pub const NAME_KEY: &str = "name";
/// Key naming the rsyslog module that produced an object.
pub const ORIGIN_KEY: &str = "origin";

/// Errors produced while grouping a [`Timeline`]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An object lacks a required key
    #[error("Stat reported at {timestamp} has no {key:?} key")]
    MissingKey {
        /// The missing key
        key: &'static str,
        /// Timestamp of the offending object
        timestamp: NaiveDateTime,
    },
    /// A required key does not hold a string
    #[error("Stat reported at {timestamp} has a non-string {key:?}: {value}")]
    NotAString {
        /// The offending key
        key: &'static str,
        /// Timestamp of the offending object
        timestamp: NaiveDateTime,
        /// The value found instead
        value: String,
    },
    /// A dynstats bucket carries a `values` key that is not an object
    #[error("dynstats.bucket {source_name} reported at {timestamp} has unexpected structure: values is {value}")]
    DynstatsValues {
        /// Name of the bucket
        source_name: String,
        /// Timestamp of the offending object
        timestamp: NaiveDateTime,
        /// The value found instead
        value: String,
    },
    /// A dynstats bucket metric is not a number
    #[error("dynstats.bucket {source_name} reported at {timestamp} has non-numeric value for {metric}: {value}")]
    DynstatsValue {
        /// Name of the bucket
        source_name: String,
        /// Name of the offending metric
        metric: String,
        /// Timestamp of the offending object
        timestamp: NaiveDateTime,
        /// The value found instead
        value: String,
    },
}

/// Values of one metric keyed by the timestamp they were reported at, in
/// first-seen order.
pub type Series = IndexMap<NaiveDateTime, MetricValue>;

#[derive(Debug, Clone, PartialEq)]
/// The metrics reported under one `name`.
pub struct Source {
    /// Origin seen with the first object of this name
    pub origin: String,
    /// Metric series keyed by metric name, in first-seen order
    pub metrics: IndexMap<String, Series>,
}

impl Source {
    fn new(origin: &str) -> Self {
        Self {
            origin: origin.to_string(),
            metrics: IndexMap::new(),
        }
    }

    fn record(&mut self, metric: &str, timestamp: NaiveDateTime, value: MetricValue) {
        self.metrics
            .entry(metric.to_string())
            .or_default()
            .insert(timestamp, value);
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
/// Every metric of a timeline, grouped by source.
pub struct Grouping {
    /// Sources keyed by name, in first-seen order
    pub sources: IndexMap<String, Source>,
    /// Metric names discovered inside dynstats buckets
    pub dynamic_names: BTreeSet<String>,
}

impl Grouping {
    /// Group every object of `timeline`.
    ///
    /// # Errors
    ///
    /// Returns an error if an object lacks a string `name` or `origin`, or if
    /// a dynstats bucket does not have the expected structure.
    pub fn from_timeline(timeline: &Timeline) -> Result<Self, Error> {
        let mut grouping = Self::default();
        for (timestamp, stats) in timeline.iter() {
            for stat in stats {
                grouping.add(*timestamp, stat)?;
            }
        }
        debug!(
            "Grouped {sources} sources, {dynamic} dynstats metrics",
            sources = grouping.sources.len(),
            dynamic = grouping.dynamic_names.len()
        );
        Ok(grouping)
    }

    /// Add the metrics of a single object reported at `timestamp`.
    ///
    /// A value already recorded for the same source, metric and timestamp is
    /// overwritten.
    ///
    /// # Errors
    ///
    /// See [`Grouping::from_timeline`].
    pub fn add(&mut self, timestamp: NaiveDateTime, stat: &Stat) -> Result<(), Error> {
        let name = required_str(stat, NAME_KEY, timestamp)?;
        let origin = required_str(stat, ORIGIN_KEY, timestamp)?;

        let source = self
            .sources
            .entry(name.to_string())
            .or_insert_with(|| Source::new(origin));

        for (key, value) in stat {
            if let Some(value) = MetricValue::from_json(value) {
                source.record(key, timestamp, value);
            } else if origin == DYNSTATS_BUCKET_ORIGIN && key == DYNSTATS_VALUES_KEY {
                let Value::Object(bucket) = value else {
                    return Err(Error::DynstatsValues {
                        source_name: name.to_string(),
                        timestamp,
                        value: value.to_string(),
                    });
                };
                for (metric, value) in bucket {
                    let Some(value) = MetricValue::from_json(value) else {
                        return Err(Error::DynstatsValue {
                            source_name: name.to_string(),
                            metric: metric.clone(),
                            timestamp,
                            value: value.to_string(),
                        });
                    };
                    source.record(metric, timestamp, value);
                    self.dynamic_names.insert(metric.clone());
                }
            }
        }
        Ok(())
    }
}

fn required_str<'a>(
    stat: &'a Stat,
    key: &'static str,
    timestamp: NaiveDateTime,
) -> Result<&'a str, Error> {
    match stat.get(key) {
        None => Err(Error::MissingKey { key, timestamp }),
        Some(Value::String(value)) => Ok(value),
        Some(other) => Err(Error::NotAString {
            key,
            timestamp,
            value: other.to_string(),
        }),
    }
}
