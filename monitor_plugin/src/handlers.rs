//! Translation between bus messages and store operations.

use crate::bus::Message;
use monitor_core::{now_timestamp, DataMap, MetricValue};
use monitor_store::{MetricStore, QueryError};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub const METRIC_REPORT: &str = "metric.report";
pub const METRIC_QUERY_RAW: &str = "metric.query.raw";
pub const METRIC_QUERY_AGGREGATE: &str = "metric.query.aggregate";

/// Keys every query response uses for its status; results may not carry them.
pub const RESERVED_RESPONSE_KEYS: [&str; 2] = ["error", "message"];

/// A metric that was accepted into the store.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedMetric {
    pub name: String,
    pub timestamp: f64,
    pub data: DataMap,
}

/// Store a `metric.report`. Reports without a usable `name` are dropped.
pub fn handle_report(store: &mut MetricStore, message: &Message) -> Option<IngestedMetric> {
    let mut payload = message.data.clone();

    let name = match payload.remove("name") {
        Some(Value::String(name)) if RESERVED_RESPONSE_KEYS.contains(&name.as_str()) => {
            warn!("Dropping metric with reserved name '{}'", name);
            return None;
        }
        Some(Value::String(name)) if !name.is_empty() => name,
        Some(other) => {
            warn!("Dropping metric with invalid name: {}", other);
            return None;
        }
        None => {
            warn!("Dropping metric without a name");
            return None;
        }
    };

    let timestamp = message
        .context
        .get("timestamp")
        .and_then(Value::as_f64)
        .filter(|ts| *ts != 0.0 && ts.is_finite())
        .unwrap_or_else(now_timestamp);

    let data: DataMap = payload
        .into_iter()
        .map(|(key, value)| (key, MetricValue::from(value)))
        .collect();

    debug!("Recording metric '{}' at {}", name, timestamp);
    store.ingest(name.clone(), timestamp, data.clone());

    Some(IngestedMetric {
        name,
        timestamp,
        data,
    })
}

pub fn handle_raw_query(store: &MetricStore, message: &Message) -> Message {
    let result = store.raw_query(requested_name(message));
    respond(message, result)
}

pub fn handle_aggregate_query(store: &MetricStore, message: &Message) -> Message {
    let result = store.aggregated_query(requested_name(message));
    respond(message, result)
}

fn requested_name(message: &Message) -> Option<&str> {
    message.data.get("name").and_then(Value::as_str)
}

fn respond<T: Serialize>(message: &Message, result: Result<T, QueryError>) -> Message {
    match result {
        Ok(payload) => match serde_json::to_value(payload) {
            Ok(Value::Object(mut data)) => {
                if let Some(key) = RESERVED_RESPONSE_KEYS
                    .iter()
                    .find(|key| data.contains_key(**key))
                {
                    warn!("Query '{}' result uses reserved key '{}'", message.msg_type, key);
                    return failure(
                        message,
                        format!("Query result contains reserved key '{}'", key),
                    );
                }
                data.insert("error".to_string(), Value::Bool(false));
                message.response(data)
            }
            Ok(other) => failure(message, format!("Unexpected query result: {}", other)),
            Err(e) => failure(message, format!("Failed to serialize query result: {}", e)),
        },
        Err(e) => {
            debug!("Query '{}' failed: {}", message.msg_type, e);
            failure(message, e.to_string())
        }
    }
}

fn failure(message: &Message, text: String) -> Message {
    let mut data = Map::new();
    data.insert("error".to_string(), Value::Bool(true));
    data.insert("message".to_string(), Value::String(text));
    message.response(data)
}
