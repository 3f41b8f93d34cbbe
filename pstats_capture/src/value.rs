//! Canonical representation of a metric sample
//!
//! impstats emits integers for nearly everything, but nothing in the JSON
//! format forbids floats. Values keep the kind they were read with so that
//! integer series report integer statistics.

use std::cmp::Ordering;

use serde::Serialize;
use serde_json::{Number, Value};

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
/// A single numeric sample of a metric.
#[serde(untagged)]
pub enum MetricValue {
    /// An integer, wide enough to hold both signed and unsigned 64 bit input
    Int(i128),
    /// A floating point, 64 bits wide
    Float(f64),
}

impl MetricValue {
    /// Interpret a JSON value as a metric sample.
    ///
    /// Only JSON numbers are samples. Booleans, strings, null and nested
    /// structures return `None`.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => Self::from_number(number),
            Value::Null | Value::Bool(_) | Value::String(_) | Value::Array(_) | Value::Object(_) => {
                None
            }
        }
    }

    fn from_number(number: &Number) -> Option<Self> {
        if let Some(int) = number.as_i64() {
            return Some(Self::Int(i128::from(int)));
        }
        if let Some(uint) = number.as_u64() {
            return Some(Self::Int(i128::from(uint)));
        }
        number.as_f64().map(Self::Float)
    }

    /// Get an f64 representation of this value. Extremely large integers will be truncated.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Int(int) => *int as f64,
            MetricValue::Float(float) => *float,
        }
    }

    /// Whether this sample is numerically zero.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_zero(&self) -> bool {
        match self {
            MetricValue::Int(int) => *int == 0,
            MetricValue::Float(float) => *float == 0.0,
        }
    }

    /// Total order across both kinds. Integers compare exactly with each
    /// other, anything involving a float compares as f64.
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (MetricValue::Int(lhs), MetricValue::Int(rhs)) => lhs.cmp(rhs),
            _ => self.as_f64().total_cmp(&other.as_f64()),
        }
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricValue::Int(int) => write!(f, "{int}"),
            MetricValue::Float(float) => write!(f, "{float}"),
        }
    }
}

/// Sum the samples. The result stays an integer while every sample is an
/// integer and the total fits, otherwise it is a float. An empty input sums
/// to integer zero.
pub fn sum<I>(values: I) -> MetricValue
where
    I: IntoIterator<Item = MetricValue>,
{
    let mut int_total: Option<i128> = Some(0);
    let mut float_total = 0.0_f64;
    let mut saw_float = false;

    for value in values {
        float_total += value.as_f64();
        match value {
            MetricValue::Int(int) => int_total = int_total.and_then(|total| total.checked_add(int)),
            MetricValue::Float(_) => saw_float = true,
        }
    }

    match int_total {
        Some(total) if !saw_float => MetricValue::Int(total),
        _ => MetricValue::Float(float_total),
    }
}

/// Arithmetic mean of the samples, `None` when there are none.
///
/// An integer total that divides exactly by the number of samples yields an
/// integer mean, every other case yields a float.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[MetricValue]) -> Option<MetricValue> {
    if values.is_empty() {
        return None;
    }
    let count = i128::try_from(values.len()).ok()?;

    let mean = match sum(values.iter().copied()) {
        MetricValue::Int(total) if total % count == 0 => MetricValue::Int(total / count),
        MetricValue::Int(total) => MetricValue::Float(total as f64 / count as f64),
        MetricValue::Float(total) => MetricValue::Float(total / count as f64),
    };
    Some(mean)
}
