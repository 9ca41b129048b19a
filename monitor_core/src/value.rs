//! Loosely-typed metric payloads.
//!
//! Metric reports carry arbitrary nested mappings whose shape is only known at
//! runtime. [`MetricValue`] mirrors the JSON data model so that any payload can
//! be stored and persisted verbatim, while the aggregation path only looks at
//! [`MetricValue::Number`] leaves.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Payload of a single metric entry, keyed by field name.
pub type DataMap = BTreeMap<String, MetricValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    List(Vec<MetricValue>),
    Map(DataMap),
}

impl MetricValue {
    /// Numeric value of a `Number` leaf. Booleans are not numbers here.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) => n.as_f64().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&DataMap> {
        match self {
            MetricValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetricValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        serde_json::Number::from_f64(value)
            .map(MetricValue::Number)
            .unwrap_or(MetricValue::Null)
    }
}

impl From<i64> for MetricValue {
    fn from(value: i64) -> Self {
        MetricValue::Number(value.into())
    }
}

impl From<bool> for MetricValue {
    fn from(value: bool) -> Self {
        MetricValue::Bool(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        MetricValue::Text(value.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(value: String) -> Self {
        MetricValue::Text(value)
    }
}

impl From<DataMap> for MetricValue {
    fn from(value: DataMap) -> Self {
        MetricValue::Map(value)
    }
}

impl From<serde_json::Value> for MetricValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => MetricValue::Null,
            serde_json::Value::Bool(b) => MetricValue::Bool(b),
            serde_json::Value::Number(n) => MetricValue::Number(n),
            serde_json::Value::String(s) => MetricValue::Text(s),
            serde_json::Value::Array(items) => {
                MetricValue::List(items.into_iter().map(MetricValue::from).collect())
            }
            serde_json::Value::Object(map) => MetricValue::Map(
                map.into_iter()
                    .map(|(key, value)| (key, MetricValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<MetricValue> for serde_json::Value {
    fn from(value: MetricValue) -> Self {
        match value {
            MetricValue::Null => serde_json::Value::Null,
            MetricValue::Bool(b) => serde_json::Value::Bool(b),
            MetricValue::Number(n) => serde_json::Value::Number(n),
            MetricValue::Text(s) => serde_json::Value::String(s),
            MetricValue::List(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            MetricValue::Map(map) => serde_json::Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, value.into()))
                    .collect(),
            ),
        }
    }
}
