use std::path::PathBuf;

/// Directory under the XDG state home that holds this application's files.
pub const STATE_DIR_NAME: &str = "neon";
pub const STATE_FILE_NAME: &str = "core_metrics.json";

/// `$XDG_STATE_HOME`, or `~/.local/state` where the platform has no notion of it.
pub fn state_home() -> PathBuf {
    dirs::state_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("state")))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn default_state_path() -> PathBuf {
    state_home().join(STATE_DIR_NAME).join(STATE_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_path_layout() {
        let path = default_state_path();
        assert!(path.ends_with("neon/core_metrics.json"));
    }
}
