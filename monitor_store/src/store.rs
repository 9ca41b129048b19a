use crate::aggregator::{MetricsAggregator, Stats};
use monitor_core::{DataMap, MetricEntry, MetricSeries, MetricStoreState};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_MAX_NUM_HISTORY: usize = 100;

/// Query failures. These are answers, not faults: callers turn them into
/// error responses.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("No metric named '{requested}'. Known metrics: {}", format_known(.known))]
    UnknownMetric {
        requested: String,
        known: Vec<String>,
    },

    #[error("A metric name is required for aggregation")]
    MissingName,
}

fn format_known(known: &[String]) -> String {
    if known.is_empty() {
        "(none)".to_string()
    } else {
        known.join(", ")
    }
}

/// Bounded per-name history of reported metrics.
#[derive(Debug, Clone)]
pub struct MetricStore {
    state: MetricStoreState,
    max_num_history: usize,
}

impl MetricStore {
    pub fn new(max_num_history: usize) -> Self {
        Self::with_state(MetricStoreState::new(), max_num_history)
    }

    /// Adopt previously persisted state, trimming any series that exceeds the
    /// retention bound, dropping entries filed under another name, and
    /// dropping empty or unnamed series.
    pub fn with_state(mut state: MetricStoreState, max_num_history: usize) -> Self {
        let max_num_history = max_num_history.max(1);

        for (name, series) in state.iter_mut() {
            let before = series.len();
            series.retain(|entry| entry.name == *name);
            let mismatched = before - series.len();
            if mismatched > 0 {
                warn!(
                    "Dropped {} restored entries filed under '{}' with a different name",
                    mismatched, name
                );
            }
        }
        state.retain(|name, series| !name.is_empty() && !series.is_empty());
        for (name, series) in state.iter_mut() {
            let evicted = trim_series(series, max_num_history);
            if evicted > 0 {
                debug!(
                    "Trimmed {} restored entries from '{}' (max_num_history={})",
                    evicted, name, max_num_history
                );
            }
        }

        Self {
            state,
            max_num_history,
        }
    }

    pub fn max_num_history(&self) -> usize {
        self.max_num_history
    }

    /// Append an observation, evicting the oldest ones past the bound.
    pub fn ingest(&mut self, name: impl Into<String>, timestamp: f64, data: DataMap) {
        let name = name.into();
        if name.is_empty() {
            warn!("Ignoring metric with an empty name");
            return;
        }

        let series = self.state.entry(name.clone()).or_default();
        series.push_back(MetricEntry::new(name, timestamp, data));
        trim_series(series, self.max_num_history);
    }

    /// All series when `name` is `None`, otherwise just the named one.
    pub fn raw_query(&self, name: Option<&str>) -> Result<MetricStoreState, QueryError> {
        match name {
            None => Ok(self.state.clone()),
            Some(name) => {
                let series = self.series(name)?;
                Ok(MetricStoreState::from([(name.to_string(), series.clone())]))
            }
        }
    }

    /// Min/max/avg of every numeric leaf path across the named series.
    pub fn aggregated_query(&self, name: Option<&str>) -> Result<BTreeMap<String, Stats>, QueryError> {
        let name = name.ok_or(QueryError::MissingName)?;
        let series = self.series(name)?;
        Ok(MetricsAggregator::aggregate(series))
    }

    pub fn known_names(&self) -> Vec<String> {
        self.state.keys().cloned().collect()
    }

    pub fn state(&self) -> &MetricStoreState {
        &self.state
    }

    pub fn into_state(self) -> MetricStoreState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    fn series(&self, name: &str) -> Result<&MetricSeries, QueryError> {
        self.state.get(name).ok_or_else(|| QueryError::UnknownMetric {
            requested: name.to_string(),
            known: self.known_names(),
        })
    }
}

impl Default for MetricStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_NUM_HISTORY)
    }
}

fn trim_series(series: &mut MetricSeries, max_num_history: usize) -> usize {
    let excess = series.len().saturating_sub(max_num_history);
    series.drain(..excess);
    excess
}

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_core::MetricValue;
    use proptest::prelude::*;
    use serde_json::json;

    fn data(value: serde_json::Value) -> DataMap {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_ingest_then_raw_query() {
        let mut store = MetricStore::new(10);
        store.ingest("stt", 1.0, data(json!({"duration": 1.0})));
        store.ingest("stt", 2.0, data(json!({"duration": 2.0, "lang": "en-us"})));

        let result = store.raw_query(Some("stt")).unwrap();
        assert_eq!(result.len(), 1);

        let series = &result["stt"];
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].timestamp, 1.0);
        assert_eq!(series[1].timestamp, 2.0);
        assert_eq!(series[1].data["lang"], MetricValue::from("en-us"));
        assert!(series.iter().all(|entry| entry.name == "stt"));
        assert!(series.iter().all(|entry| !entry.data.contains_key("name")));
    }

    #[test]
    fn test_raw_query_all() {
        let mut store = MetricStore::default();
        store.ingest("a", 1.0, DataMap::new());
        store.ingest("b", 2.0, DataMap::new());

        let result = store.raw_query(None).unwrap();
        assert_eq!(result.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_raw_query_unknown_lists_known_names() {
        let mut store = MetricStore::default();
        store.ingest("a", 1.0, DataMap::new());
        store.ingest("b", 2.0, DataMap::new());

        let err = store.raw_query(Some("missing")).unwrap_err();
        assert_eq!(
            err,
            QueryError::UnknownMetric {
                requested: "missing".to_string(),
                known: vec!["a".to_string(), "b".to_string()],
            }
        );

        let message = err.to_string();
        assert!(message.contains("missing"));
        assert!(message.contains("a"));
        assert!(message.contains("b"));
    }

    #[test]
    fn test_aggregated_query() {
        let mut store = MetricStore::default();
        store.ingest("stt", 1.0, data(json!({"duration": 1.0})));
        store.ingest("stt", 2.0, data(json!({"duration": 3.0})));

        let result = store.aggregated_query(Some("stt")).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result["duration"], Stats { min: 1.0, max: 3.0, avg: 2.0 });
    }

    #[test]
    fn test_aggregated_query_nested_paths() {
        let mut store = MetricStore::default();
        for (i, value) in [0.4, 0.1, 0.7].iter().enumerate() {
            store.ingest(
                "speech",
                i as f64,
                data(json!({"timestamps": {"handle_utterance": value}, "utterance": "hi"})),
            );
        }

        let result = store.aggregated_query(Some("speech")).unwrap();
        let stats = result["timestamps.handle_utterance"];
        assert!(stats.min <= stats.avg && stats.avg <= stats.max);
        assert_eq!(stats.min, 0.1);
        assert_eq!(stats.max, 0.7);
        assert!(!result.contains_key("utterance"));
    }

    #[test]
    fn test_aggregated_query_errors() {
        let mut store = MetricStore::default();
        store.ingest("a", 1.0, DataMap::new());

        assert_eq!(store.aggregated_query(None).unwrap_err(), QueryError::MissingName);
        assert!(matches!(
            store.aggregated_query(Some("b")),
            Err(QueryError::UnknownMetric { .. })
        ));
    }

    #[test]
    fn test_empty_name_is_ignored() {
        let mut store = MetricStore::default();
        store.ingest("", 1.0, DataMap::new());
        assert!(store.is_empty());
    }

    #[test]
    fn test_with_state_applies_bound() {
        let mut state = MetricStoreState::new();
        state.insert(
            "stt".to_string(),
            (0..5)
                .map(|i| MetricEntry::new("stt", i as f64, DataMap::new()))
                .collect(),
        );
        state.insert("empty".to_string(), MetricSeries::new());

        let store = MetricStore::with_state(state, 3);
        let series = &store.state()["stt"];
        assert_eq!(series.len(), 3);
        assert_eq!(series.front().unwrap().timestamp, 2.0);
        assert_eq!(store.known_names(), vec!["stt".to_string()]);
    }

    #[test]
    fn test_with_state_drops_misfiled_entries() {
        let mut state = MetricStoreState::new();
        state.insert(
            "stt".to_string(),
            MetricSeries::from(vec![
                MetricEntry::new("stt", 1.0, DataMap::new()),
                MetricEntry::new("tts", 2.0, DataMap::new()),
                MetricEntry::new("stt", 3.0, DataMap::new()),
            ]),
        );
        state.insert(
            "wake".to_string(),
            MetricSeries::from(vec![MetricEntry::new("other", 1.0, DataMap::new())]),
        );

        let store = MetricStore::with_state(state, 10);

        let timestamps: Vec<f64> = store.state()["stt"].iter().map(|e| e.timestamp).collect();
        assert_eq!(timestamps, vec![1.0, 3.0]);
        assert!(store.state()["stt"].iter().all(|e| e.name == "stt"));
        assert_eq!(store.known_names(), vec!["stt".to_string()]);
    }

    #[test]
    fn test_zero_bound_keeps_latest_entry() {
        let mut store = MetricStore::new(0);
        store.ingest("a", 1.0, DataMap::new());
        store.ingest("a", 2.0, DataMap::new());
        assert_eq!(store.max_num_history(), 1);
        assert_eq!(store.state()["a"].len(), 1);
        assert_eq!(store.state()["a"][0].timestamp, 2.0);
    }

    proptest! {
        #[test]
        fn retention_keeps_most_recent(max in 1usize..16, count in 0usize..64) {
            let mut store = MetricStore::new(max);
            for i in 0..count {
                store.ingest("metric", i as f64, DataMap::new());
                let series = &store.state()["metric"];
                prop_assert!(series.len() <= max);
                prop_assert_eq!(series.back().map(|e| e.timestamp), Some(i as f64));
            }

            if count > 0 {
                let series = &store.state()["metric"];
                let expected: Vec<f64> = (count.saturating_sub(max)..count).map(|i| i as f64).collect();
                let actual: Vec<f64> = series.iter().map(|e| e.timestamp).collect();
                prop_assert_eq!(actual, expected);
            }
        }
    }
}
