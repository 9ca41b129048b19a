use monitor_store::DEFAULT_MAX_NUM_HISTORY;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Plugin settings.
///
/// Built leniently from a loosely-typed settings map: a flag only leaves its
/// default when it holds the matching boolean literal, and anything else
/// (missing, null, strings, numbers) falls back to the default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorConfig {
    /// Restore state on startup and persist it on shutdown. Default `true`.
    pub save_locally: bool,
    /// Forward every accepted metric to the remote sink. Default `false`.
    pub upload_enabled: bool,
    pub max_num_history: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_path: Option<PathBuf>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            save_locally: true,
            upload_enabled: false,
            max_num_history: DEFAULT_MAX_NUM_HISTORY,
            upload_endpoint: None,
            state_path: None,
        }
    }
}

impl MonitorConfig {
    pub fn builder() -> MonitorConfigBuilder {
        MonitorConfigBuilder::default()
    }

    pub fn from_settings(settings: &Map<String, Value>) -> Self {
        let defaults = Self::default();

        let save_locally = !matches!(settings.get("save_locally"), Some(Value::Bool(false)));
        let upload_enabled = matches!(settings.get("upload_enabled"), Some(Value::Bool(true)));
        let max_num_history = settings
            .get("max_num_history")
            .and_then(Value::as_u64)
            .filter(|n| *n > 0)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(defaults.max_num_history);
        let upload_endpoint = settings
            .get("upload_endpoint")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let state_path = settings
            .get("state_path")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Self {
            save_locally,
            upload_enabled,
            max_num_history,
            upload_endpoint,
            state_path,
        }
    }

    /// Where state is persisted: the explicit override, else the XDG location.
    pub fn resolved_state_path(&self) -> PathBuf {
        self.state_path
            .clone()
            .unwrap_or_else(crate::paths::default_state_path)
    }
}

#[derive(Default)]
pub struct MonitorConfigBuilder {
    save_locally: Option<bool>,
    upload_enabled: Option<bool>,
    max_num_history: Option<usize>,
    upload_endpoint: Option<String>,
    state_path: Option<PathBuf>,
}

impl MonitorConfigBuilder {
    pub fn save_locally(mut self, save_locally: bool) -> Self {
        self.save_locally = Some(save_locally);
        self
    }

    pub fn upload_enabled(mut self, upload_enabled: bool) -> Self {
        self.upload_enabled = Some(upload_enabled);
        self
    }

    pub fn max_num_history(mut self, max_num_history: usize) -> Self {
        self.max_num_history = Some(max_num_history);
        self
    }

    pub fn upload_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.upload_endpoint = Some(endpoint.into());
        self
    }

    pub fn state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_path = Some(path.into());
        self
    }

    pub fn build(self) -> MonitorConfig {
        let defaults = MonitorConfig::default();
        MonitorConfig {
            save_locally: self.save_locally.unwrap_or(defaults.save_locally),
            upload_enabled: self.upload_enabled.unwrap_or(defaults.upload_enabled),
            max_num_history: self
                .max_num_history
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_num_history),
            upload_endpoint: self.upload_endpoint,
            state_path: self.state_path,
        }
    }
}
