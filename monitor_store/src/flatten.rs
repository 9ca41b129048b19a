use monitor_core::{DataMap, MetricValue};
use std::collections::BTreeMap;

/// Numeric leaves grouped by dot-delimited path, in the order they were seen.
pub type FlattenedValues = BTreeMap<String, Vec<f64>>;

/// Walk every payload and collect numeric leaves under their dotted path,
/// e.g. `{"timestamps": {"handle_utterance": 0.2}}` lands under
/// `timestamps.handle_utterance`. Strings, lists, booleans and nulls are skipped.
pub fn flatten_payloads<'a, I>(payloads: I) -> FlattenedValues
where
    I: IntoIterator<Item = &'a DataMap>,
{
    let mut flattened = FlattenedValues::new();
    for payload in payloads {
        flatten_into("", payload, &mut flattened);
    }
    flattened
}

fn flatten_into(prefix: &str, map: &DataMap, out: &mut FlattenedValues) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            MetricValue::Map(nested) => flatten_into(&path, nested, out),
            leaf => {
                if let Some(number) = leaf.as_f64() {
                    out.entry(path).or_default().push(number);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> DataMap {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_flatten_nested_paths() {
        let first = payload(json!({
            "duration": 1.0,
            "timestamps": {"handle_utterance": 0.5, "transcribed": 0.75}
        }));
        let second = payload(json!({
            "duration": 3.0,
            "timestamps": {"handle_utterance": 1.5}
        }));

        let flattened = flatten_payloads([&first, &second]);

        assert_eq!(flattened["duration"], vec![1.0, 3.0]);
        assert_eq!(flattened["timestamps.handle_utterance"], vec![0.5, 1.5]);
        assert_eq!(flattened["timestamps.transcribed"], vec![0.75]);
        assert_eq!(flattened.len(), 3);
    }

    #[test]
    fn test_flatten_skips_non_numeric_leaves() {
        let data = payload(json!({
            "lang": "en-us",
            "ok": true,
            "tags": [1, 2],
            "nothing": null,
            "deep": {"deeper": {"value": 7}}
        }));

        let flattened = flatten_payloads([&data]);

        assert_eq!(flattened.len(), 1);
        assert_eq!(flattened["deep.deeper.value"], vec![7.0]);
    }

    #[test]
    fn test_flatten_mixed_types_at_same_path() {
        let numeric = payload(json!({"value": 2}));
        let text = payload(json!({"value": "n/a"}));

        let flattened = flatten_payloads([&numeric, &text]);

        assert_eq!(flattened["value"], vec![2.0]);
    }

    #[test]
    fn test_flatten_empty_payloads() {
        let empty = DataMap::new();
        assert!(flatten_payloads([&empty]).is_empty());
        assert!(flatten_payloads(std::iter::empty()).is_empty());
    }
}
