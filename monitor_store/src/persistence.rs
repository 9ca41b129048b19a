//! On-disk snapshot of the store.
//!
//! The file holds a single JSON document mapping metric names to their
//! entries. A damaged file is never fatal: it is logged, removed, and the
//! store starts empty.

use monitor_core::{MetricStoreState, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing was persisted yet.
    NoFile,
    /// Prior state was read back.
    Restored,
    /// The file could not be read or parsed and was deleted.
    Discarded,
}

#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> (MetricStoreState, LoadOutcome) {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            debug!("No persisted metrics at {}", self.path.display());
            return (MetricStoreState::new(), LoadOutcome::NoFile);
        }

        match self.read().await {
            Ok(state) => {
                info!(
                    "Restored {} metric series from {}",
                    state.len(),
                    self.path.display()
                );
                (state, LoadOutcome::Restored)
            }
            Err(e) => {
                error!("Failed to load {}: {}", self.path.display(), e);
                if let Err(e) = tokio::fs::remove_file(&self.path).await {
                    error!("Failed to remove {}: {}", self.path.display(), e);
                }
                (MetricStoreState::new(), LoadOutcome::Discarded)
            }
        }
    }

    /// Write the full state, replacing any previous snapshot.
    pub async fn save(&self, state: &MetricStoreState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_vec(state)?;
        let staging = self.staging_path();
        tokio::fs::write(&staging, json).await?;
        tokio::fs::rename(&staging, &self.path).await?;

        info!(
            "Saved {} metric series to {}",
            state.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Decode a snapshot without touching the filesystem.
    pub fn parse(contents: &[u8]) -> Result<MetricStoreState> {
        Ok(serde_json::from_slice(contents)?)
    }

    async fn read(&self) -> Result<MetricStoreState> {
        let contents = tokio::fs::read(&self.path).await?;
        Self::parse(&contents)
    }

    fn staging_path(&self) -> PathBuf {
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        PathBuf::from(staging)
    }
}
