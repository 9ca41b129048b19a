use async_trait::async_trait;
use monitor_core::{DataMap, MonitorError, Result};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

/// Remote destination for reported metrics.
#[async_trait]
pub trait MetricSink: Send + Sync {
    async fn report(&self, name: &str, timestamp: f64, data: &DataMap) -> Result<()>;
}

/// Posts each metric as a flat JSON object: `{name, timestamp, ...data}`.
pub struct HttpSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSink {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| MonitorError::UploadFailed(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

pub(crate) fn upload_body(name: &str, timestamp: f64, data: &DataMap) -> Map<String, Value> {
    let mut body: Map<String, Value> = data
        .iter()
        .map(|(key, value)| (key.clone(), Value::from(value.clone())))
        .collect();
    body.insert("name".to_string(), Value::String(name.to_string()));
    body.insert("timestamp".to_string(), Value::from(timestamp));
    body
}

#[async_trait]
impl MetricSink for HttpSink {
    async fn report(&self, name: &str, timestamp: f64, data: &DataMap) -> Result<()> {
        debug!("Uploading metric '{}' to {}", name, self.endpoint);

        self.client
            .post(&self.endpoint)
            .json(&upload_body(name, timestamp, data))
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| MonitorError::UploadFailed(e.to_string()))?;

        Ok(())
    }
}
