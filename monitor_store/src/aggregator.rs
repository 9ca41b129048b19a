use crate::flatten::flatten_payloads;
use monitor_core::MetricEntry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

impl Stats {
    /// `None` when there is nothing to summarize. Non-finite values are skipped.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut count = 0usize;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut mean = 0.0;
        for &value in values.iter().filter(|v| v.is_finite()) {
            count += 1;
            min = min.min(value);
            max = max.max(value);
            // Incremental mean: a running sum overflows on large inputs.
            mean += (value - mean) / count as f64;
        }

        if count == 0 {
            return None;
        }

        // Rounding in the mean must not push it outside [min, max].
        let avg = mean.clamp(min, max);

        Some(Self { min, max, avg })
    }
}

pub struct MetricsAggregator;

impl MetricsAggregator {
    pub fn aggregate<'a, I>(entries: I) -> BTreeMap<String, Stats>
    where
        I: IntoIterator<Item = &'a MetricEntry>,
    {
        flatten_payloads(entries.into_iter().map(|entry| &entry.data))
            .into_iter()
            .filter_map(|(path, values)| Stats::from_values(&values).map(|stats| (path, stats)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(data: serde_json::Value) -> MetricEntry {
        MetricEntry::new("test", 0.0, serde_json::from_value(data).unwrap())
    }

    #[test]
    fn test_stats_from_values() {
        let stats = Stats::from_values(&[1.0, 3.0]).unwrap();
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 3.0);
        assert_eq!(stats.avg, 2.0);

        let single = Stats::from_values(&[4.5]).unwrap();
        assert_eq!(single, Stats { min: 4.5, max: 4.5, avg: 4.5 });

        assert!(Stats::from_values(&[]).is_none());
        assert!(Stats::from_values(&[f64::NAN]).is_none());
    }

    #[test]
    fn test_stats_large_values_do_not_overflow() {
        let stats = Stats::from_values(&[f64::MAX, f64::MAX, 0.0]).unwrap();
        let expected = f64::MAX / 3.0 * 2.0;
        assert!(stats.avg.is_finite());
        assert!((stats.avg - expected).abs() <= expected * 1e-12);
        assert!(stats.avg < stats.max);
    }

    #[test]
    fn test_aggregation() {
        let entries = vec![
            entry(json!({"duration": 1.0, "timestamps": {"handle_utterance": 0.1}})),
            entry(json!({"duration": 3.0, "timestamps": {"handle_utterance": 0.3}})),
            entry(json!({"duration": 2.0, "utterance": "what time is it"})),
        ];

        let aggregated = MetricsAggregator::aggregate(&entries);

        assert_eq!(aggregated.len(), 2);
        assert_eq!(aggregated["duration"], Stats { min: 1.0, max: 3.0, avg: 2.0 });

        let nested = aggregated["timestamps.handle_utterance"];
        assert_eq!(nested.min, 0.1);
        assert_eq!(nested.max, 0.3);
        assert!(nested.min <= nested.avg && nested.avg <= nested.max);
        assert!(!aggregated.contains_key("utterance"));
    }

    #[test]
    fn test_aggregation_without_numeric_leaves() {
        let entries = vec![entry(json!({"lang": "en-us"}))];
        assert!(MetricsAggregator::aggregate(&entries).is_empty());
    }
}
