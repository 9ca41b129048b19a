use crate::value::DataMap;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// A single observation reported for a metric name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEntry {
    pub name: String,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    #[serde(default)]
    pub data: DataMap,
}

/// Entries sharing one name, oldest first.
pub type MetricSeries = VecDeque<MetricEntry>;

/// Everything the store holds, keyed by metric name.
pub type MetricStoreState = BTreeMap<String, MetricSeries>;

impl MetricEntry {
    pub fn new(name: impl Into<String>, timestamp: f64, data: DataMap) -> Self {
        Self {
            name: name.into(),
            timestamp,
            data,
        }
    }
}

/// Current wall-clock time as fractional epoch seconds.
pub fn now_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
