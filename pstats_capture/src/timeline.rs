//! Observations grouped by the timestamp they were reported at
//!
//! impstats writes every counter of one reporting interval under the same
//! date header, so a single timestamp usually carries many objects. The
//! timeline keeps them in the order they were read: timestamps in first-seen
//! order, objects within a timestamp in line order.

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

/// `strftime` form used when a timestamp is rendered as a JSON string.
pub const ISO_8601_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Key under which a flattened observation carries its timestamp.
pub const TIMESTAMP_KEY: &str = "timestamp";

/// A JSON object as read from one log line.
pub type Stat = Map<String, Value>;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
/// Insertion ordered mapping from timestamp to the objects seen at it.
pub struct Timeline {
    groups: IndexMap<NaiveDateTime, Vec<Stat>>,
}

impl Timeline {
    /// Create an empty timeline
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `stat` to the objects recorded at `timestamp`.
    pub fn push(&mut self, timestamp: NaiveDateTime, stat: Stat) {
        self.groups.entry(timestamp).or_default().push(stat);
    }

    /// Iterate timestamps in first-seen order with their objects.
    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDateTime, &[Stat])> {
        self.groups
            .iter()
            .map(|(timestamp, stats)| (timestamp, stats.as_slice()))
    }

    /// Number of distinct timestamps
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no observation has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of objects across all timestamps
    #[must_use]
    pub fn stat_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// The first timestamp seen, not necessarily the earliest.
    #[must_use]
    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.groups.first().map(|(timestamp, _)| *timestamp)
    }

    /// The last timestamp seen, not necessarily the latest.
    #[must_use]
    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.groups.last().map(|(timestamp, _)| *timestamp)
    }

    /// One object per observation, each led by a `timestamp` key holding the
    /// ISO 8601 form of the timestamp it was reported at. A `timestamp` key
    /// already present in the object keeps the leading position but its own
    /// value.
    #[must_use]
    pub fn flatten(&self) -> Vec<Stat> {
        let mut flattened = Vec::with_capacity(self.stat_count());
        for (timestamp, stats) in &self.groups {
            let rendered = Value::String(timestamp.format(ISO_8601_FORMAT).to_string());
            for stat in stats {
                let mut current = Map::with_capacity(stat.len() + 1);
                current.insert(TIMESTAMP_KEY.to_string(), rendered.clone());
                for (key, value) in stat {
                    current.insert(key.clone(), value.clone());
                }
                flattened.push(current);
            }
        }
        flattened
    }
}
