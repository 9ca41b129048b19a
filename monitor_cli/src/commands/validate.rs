use crate::ui;
use anyhow::Result;
use monitor_plugin::parse_config_from_file;
use std::path::PathBuf;

pub async fn execute(config_file: PathBuf) -> Result<()> {
    println!("Validating settings: {}", config_file.display());

    let config = parse_config_from_file(&config_file).await?;

    ui::print_success("Settings are valid");
    println!("\n{}", serde_yaml::to_string(&config)?.trim_end());
    println!("resolved_state_path: {}", config.resolved_state_path().display());

    if config.upload_enabled && config.upload_endpoint.is_none() {
        ui::print_warning("upload_enabled is set but no upload_endpoint is configured");
    }

    Ok(())
}
