//! In-process stand-in for the host message bus.
//!
//! Handlers only ever see [`Message`] values; the broadcast channel below is
//! the thin adapter that moves them between publishers and subscribers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tracing::debug;

pub const DEFAULT_BUS_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub context: Map<String, Value>,
}

impl Message {
    /// Non-object `data` is treated as an empty payload.
    pub fn new(msg_type: impl Into<String>, data: Value) -> Self {
        Self {
            msg_type: msg_type.into(),
            data: into_map(data),
            context: Map::new(),
        }
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = into_map(context);
        self
    }

    /// Reply to this message, keeping its context.
    pub fn response(&self, data: Map<String, Value>) -> Self {
        Self {
            msg_type: format!("{}.response", self.msg_type),
            data,
            context: self.context.clone(),
        }
    }
}

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[derive(Debug, Clone)]
pub struct MessageBus {
    sender: broadcast::Sender<Message>,
}

impl MessageBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish to every current subscriber. Returns how many received it.
    pub fn emit(&self, message: Message) -> usize {
        match self.sender.send(message) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(message)) => {
                debug!("No subscribers for '{}'", message.msg_type);
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.sender.subscribe()
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}
