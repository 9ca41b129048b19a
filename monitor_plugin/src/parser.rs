use crate::config::MonitorConfig;
use anyhow::Result;
use serde_json::{Map, Value};
use std::path::Path;

/// Settings may sit at the top level or under this key.
const SECTION: &str = "monitor";

pub async fn parse_config_from_file(path: impl AsRef<Path>) -> Result<MonitorConfig> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path).await?;

    let extension = path.extension().and_then(|s| s.to_str());

    match extension {
        Some("yaml") | Some("yml") => parse_yaml(&contents),
        Some("toml") => parse_toml(&contents),
        Some("json") => parse_json(&contents),
        _ => Err(anyhow::anyhow!(
            "Unsupported file format. Use .yaml, .yml, .toml, or .json"
        )),
    }
}

pub fn parse_config_from_str(content: &str, format: &str) -> Result<MonitorConfig> {
    match format.to_lowercase().as_str() {
        "yaml" | "yml" => parse_yaml(content),
        "toml" => parse_toml(content),
        "json" => parse_json(content),
        _ => Err(anyhow::anyhow!("Unsupported format: {}", format)),
    }
}

fn parse_yaml(content: &str) -> Result<MonitorConfig> {
    let value: Value = serde_yaml::from_str(content)?;
    settings_to_config(value)
}

fn parse_toml(content: &str) -> Result<MonitorConfig> {
    let value: Value = toml::from_str(content)?;
    settings_to_config(value)
}

fn parse_json(content: &str) -> Result<MonitorConfig> {
    let value: Value = serde_json::from_str(content)?;
    settings_to_config(value)
}

fn settings_to_config(value: Value) -> Result<MonitorConfig> {
    let settings = match value {
        Value::Null => Map::new(),
        Value::Object(mut map) => match map.remove(SECTION) {
            Some(Value::Object(section)) => section,
            Some(other) => {
                map.insert(SECTION.to_string(), other);
                map
            }
            None => map,
        },
        other => {
            return Err(anyhow::anyhow!(
                "Settings must be a mapping, found: {}",
                other
            ))
        }
    };

    Ok(MonitorConfig::from_settings(&settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
save_locally: false
upload_enabled: true
max_num_history: 20
"#;

        let config = parse_yaml(yaml).unwrap();
        assert!(!config.save_locally);
        assert!(config.upload_enabled);
        assert_eq!(config.max_num_history, 20);
    }

    #[test]
    fn test_parse_toml_section() {
        let toml = r#"
[monitor]
save_locally = true
upload_enabled = "yes"
max_num_history = 5
state_path = "/var/lib/monitor/core_metrics.json"
"#;

        let config = parse_toml(toml).unwrap();
        assert!(config.save_locally);
        assert!(!config.upload_enabled);
        assert_eq!(config.max_num_history, 5);
        assert_eq!(
            config.state_path,
            Some(PathBuf::from("/var/lib/monitor/core_metrics.json"))
        );
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{"save_locally": "", "upload_enabled": ""}"#;

        let config = parse_json(json).unwrap();
        assert!(config.save_locally);
        assert!(!config.upload_enabled);
    }

    #[test]
    fn test_parse_empty_mapping() {
        let config = parse_yaml("{}").unwrap();
        assert_eq!(config, MonitorConfig::default());
    }

    #[test]
    fn test_non_mapping_is_rejected() {
        assert!(parse_json("[1, 2, 3]").is_err());
        assert!(parse_config_from_str("x", "ini").is_err());
    }

    #[tokio::test]
    async fn test_parse_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monitor.yml");
        tokio::fs::write(&path, "max_num_history: 3\n").await.unwrap();

        let config = parse_config_from_file(&path).await.unwrap();
        assert_eq!(config.max_num_history, 3);

        let unsupported = dir.path().join("monitor.ini");
        tokio::fs::write(&unsupported, "").await.unwrap();
        assert!(parse_config_from_file(&unsupported).await.is_err());
    }
}
