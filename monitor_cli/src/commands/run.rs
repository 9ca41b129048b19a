use anyhow::Result;
use monitor_plugin::bus::DEFAULT_BUS_CAPACITY;
use monitor_plugin::{CoreMonitor, Message, MessageBus};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

pub async fn execute(config: Option<PathBuf>, events: Option<PathBuf>) -> Result<()> {
    let config = super::load_config(config).await?;
    let messages = read_messages(events).await?;

    info!(
        "Replaying {} messages (state: {})",
        messages.len(),
        config.resolved_state_path().display()
    );

    // Room for every message and its response, so nothing is overwritten.
    let bus = MessageBus::new(messages.len() * 2 + DEFAULT_BUS_CAPACITY);
    let monitor = Arc::new(CoreMonitor::new(config).await);
    monitor.attach(&bus).await;

    let mut responses = bus.subscribe();
    for message in messages {
        bus.emit(message);
    }

    monitor.shutdown().await;

    while let Ok(message) = responses.try_recv() {
        if message.msg_type.ends_with(".response") {
            println!("{}", serde_json::to_string(&message)?);
        }
    }

    Ok(())
}

async fn read_messages(events: Option<PathBuf>) -> Result<Vec<Message>> {
    let contents = match events {
        Some(path) => tokio::fs::read_to_string(&path).await?,
        None => {
            let mut buffer = String::new();
            tokio::io::stdin().read_to_string(&mut buffer).await?;
            buffer
        }
    };

    Ok(parse_messages(&contents))
}

fn parse_messages(contents: &str) -> Vec<Message> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty() && !line.trim_start().starts_with('#'))
        .filter_map(|(index, line)| match serde_json::from_str::<Message>(line) {
            Ok(message) => Some(message),
            Err(e) => {
                warn!("Skipping line {}: {}", index + 1, e);
                None
            }
        })
        .collect()
}
