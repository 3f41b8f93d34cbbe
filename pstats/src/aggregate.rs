//! Per metric statistics
//!
//! Every metric series of a [`Grouping`] is reduced to counts, extremes and
//! means. impstats counters sit at zero whenever a component is idle, so the
//! statistics are also computed over the non-zero part of each series along
//! with the period that part covers. Sums are only reported for counters,
//! summing gauges such as `maxrss` over time is meaningless.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use pstats_capture::value::{self, MetricValue};
use serde::Serialize;

use crate::{
    config::Options,
    group::{Grouping, Series},
};

/// Metric names for which a sum across samples is meaningful.
pub const SUMMABLE_METRICS: &[&str] = &[
    // queues
    "msgs.received",
    "called.recvmsg",
    "discarded.nf",
    "discarded.full",
    "full",
    // imptcp & imudp
    "submitted",
    // imptcp
    "sessions.opened",
    "sessions.closed",
    "sessions.openfailed",
    "bytes.received",
    "bytes.decompressed",
    // imudp worker threads
    "called.recvmmsg",
    // actions
    "processed",
    "failed",
    "suspended",
    "resumed",
    // resource usage, see getrusage(2)
    "utime",
    "stime",
    "minflt",
    "majflt",
    "inblock",
    "oublock",
    "nvcsw",
    "nivcsw",
];

/// Errors produced while aggregating
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A series holds no value at all
    #[error("Metric {metric} of {source_name} has no values")]
    EmptySeries {
        /// Name of the source
        source_name: String,
        /// Name of the metric
        metric: String,
    },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
/// Statistics over the non-zero values of a series.
///
/// Every field is `None` only when the series never left zero and zero
/// values were asked for, in which case they serialize as explicit nulls.
pub struct NonZero {
    /// Mean of the non-zero values
    pub mean_non_zero: Option<MetricValue>,
    /// Timestamp of the first non-zero value, in series order
    pub timestamp_non_zero_min: Option<NaiveDateTime>,
    /// Timestamp of the last non-zero value, in series order
    pub timestamp_non_zero_max: Option<NaiveDateTime>,
    /// Whole seconds between the first and last non-zero value
    pub time_delta_seconds_non_zero: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Statistics of one metric series.
pub struct AggregatedMetric {
    /// Echo of the series, see [`Options::show_values`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Series>,
    /// Number of values
    pub count: usize,
    /// Number of values that are not zero
    pub count_non_zero: usize,
    /// Smallest value
    pub min: MetricValue,
    /// Largest value
    pub max: MetricValue,
    /// Mean of all values
    pub mean: MetricValue,
    /// Statistics over the non-zero values
    #[serde(flatten)]
    pub non_zero: Option<NonZero>,
    /// Sum of all values, only for summable metrics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum: Option<MetricValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Statistics of every metric of one source.
pub struct AggregatedSource {
    /// Origin of the source
    pub origin: String,
    /// Statistics keyed by metric name, in first-seen order
    pub metrics: IndexMap<String, AggregatedMetric>,
}

/// Statistics keyed by source name, in first-seen order.
pub type AggregatedStats = IndexMap<String, AggregatedSource>;

/// Whether a sum over `metric` is meaningful.
#[must_use]
pub fn is_summable(metric: &str, dynamic_names: &BTreeSet<String>) -> bool {
    SUMMABLE_METRICS.contains(&metric) || dynamic_names.contains(metric)
}

/// Aggregate every series of `grouping`.
///
/// # Errors
///
/// Returns an error if a series is empty.
pub fn aggregate(grouping: &Grouping, options: &Options) -> Result<AggregatedStats, Error> {
    let mut stats = AggregatedStats::with_capacity(grouping.sources.len());
    for (source_name, source) in &grouping.sources {
        let mut metrics = IndexMap::with_capacity(source.metrics.len());
        for (metric, series) in &source.metrics {
            let summable = is_summable(metric, &grouping.dynamic_names);
            let aggregated =
                aggregate_series(series, summable, options).ok_or_else(|| Error::EmptySeries {
                    source_name: source_name.clone(),
                    metric: metric.clone(),
                })?;
            metrics.insert(metric.clone(), aggregated);
        }
        stats.insert(
            source_name.clone(),
            AggregatedSource {
                origin: source.origin.clone(),
                metrics,
            },
        );
    }
    Ok(stats)
}

/// Aggregate a single series, `None` if the series is empty.
///
/// The first and last non-zero timestamps are taken in series order, which
/// is chronological only as far as the input was.
#[must_use]
pub fn aggregate_series(
    series: &Series,
    summable: bool,
    options: &Options,
) -> Option<AggregatedMetric> {
    let values: Vec<MetricValue> = series.values().copied().collect();
    let min = values.iter().copied().min_by(MetricValue::total_cmp)?;
    let max = values.iter().copied().max_by(MetricValue::total_cmp)?;
    let mean = value::mean(&values)?;

    let non_zero_series: Series = series
        .iter()
        .filter(|(_, value)| !value.is_zero())
        .map(|(timestamp, value)| (*timestamp, *value))
        .collect();

    let non_zero = match (non_zero_series.first(), non_zero_series.last()) {
        (Some((first, _)), Some((last, _))) => {
            let non_zero_values: Vec<MetricValue> = non_zero_series.values().copied().collect();
            Some(NonZero {
                mean_non_zero: value::mean(&non_zero_values),
                timestamp_non_zero_min: Some(*first),
                timestamp_non_zero_max: Some(*last),
                time_delta_seconds_non_zero: Some((*last - *first).num_seconds()),
            })
        }
        _ if options.show_zero_values => Some(NonZero::default()),
        _ => None,
    };

    let sum = summable.then(|| value::sum(values.iter().copied()));

    let count_non_zero = non_zero_series.len();
    let values = match (options.show_values, options.show_zero_values) {
        (true, true) => Some(series.clone()),
        (true, false) => Some(non_zero_series),
        (false, _) => None,
    };

    Some(AggregatedMetric {
        values,
        count: series.len(),
        count_non_zero,
        min,
        max,
        mean,
        non_zero,
        sum,
    })
}
