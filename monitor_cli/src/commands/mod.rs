pub mod aggregate;
pub mod query;
pub mod run;
pub mod validate;

use anyhow::Result;
use monitor_core::MetricStoreState;
use monitor_plugin::{parse_config_from_file, MonitorConfig};
use monitor_store::StateFile;
use std::path::PathBuf;

pub async fn load_config(config: Option<PathBuf>) -> Result<MonitorConfig> {
    match config {
        Some(path) => parse_config_from_file(path).await,
        None => Ok(MonitorConfig::default()),
    }
}

/// Read persisted state without the startup recovery path: a broken file is
/// reported, not deleted.
pub async fn read_state(
    state: Option<PathBuf>,
    config: Option<PathBuf>,
) -> Result<(PathBuf, MetricStoreState)> {
    let path = match state {
        Some(path) => path,
        None => load_config(config).await?.resolved_state_path(),
    };

    let contents = tokio::fs::read(&path)
        .await
        .map_err(|e| anyhow::anyhow!("Cannot read {}: {}", path.display(), e))?;
    let state = StateFile::parse(&contents)?;
    Ok((path, state))
}
