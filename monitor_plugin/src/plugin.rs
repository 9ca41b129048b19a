use crate::bus::{Message, MessageBus};
use crate::config::MonitorConfig;
use crate::handlers::{
    self, IngestedMetric, METRIC_QUERY_AGGREGATE, METRIC_QUERY_RAW, METRIC_REPORT,
};
use crate::sink::{HttpSink, MetricSink};
use monitor_core::MetricStoreState;
use monitor_store::{LoadOutcome, MetricStore, StateFile};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Collects metrics reported on the bus and answers queries about them.
///
/// All store access goes through one mutex, so a query never sees a series
/// halfway through an append or eviction.
pub struct CoreMonitor {
    config: MonitorConfig,
    store: Arc<Mutex<MetricStore>>,
    state_file: StateFile,
    sink: Option<Arc<dyn MetricSink>>,
    cancel: CancellationToken,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl CoreMonitor {
    /// Build a monitor whose upload sink, if any, comes from the config.
    pub async fn new(config: MonitorConfig) -> Self {
        let sink = match (config.upload_enabled, &config.upload_endpoint) {
            (true, Some(endpoint)) => match HttpSink::new(endpoint.clone()) {
                Ok(sink) => Some(Arc::new(sink) as Arc<dyn MetricSink>),
                Err(e) => {
                    error!("Failed to create upload sink: {}", e);
                    None
                }
            },
            (true, None) => {
                warn!("Upload enabled but no upload_endpoint configured");
                None
            }
            (false, _) => None,
        };

        Self::with_sink(config, sink).await
    }

    pub async fn with_sink(config: MonitorConfig, sink: Option<Arc<dyn MetricSink>>) -> Self {
        let state_file = StateFile::new(config.resolved_state_path());

        let state = if config.save_locally {
            let (state, outcome) = state_file.load().await;
            if outcome == LoadOutcome::Discarded {
                warn!("Starting with empty metrics after discarding corrupt state");
            }
            state
        } else {
            MetricStoreState::new()
        };

        let store = MetricStore::with_state(state, config.max_num_history);
        info!(
            "Core monitor started with {} metric series (max_num_history={})",
            store.len(),
            store.max_num_history()
        );

        Self {
            config,
            store: Arc::new(Mutex::new(store)),
            state_file,
            sink,
            cancel: CancellationToken::new(),
            listener: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn state_path(&self) -> &std::path::Path {
        self.state_file.path()
    }

    /// Handle one bus message; returns the response to emit, if any.
    pub async fn handle_message(&self, message: &Message) -> Option<Message> {
        match message.msg_type.as_str() {
            METRIC_REPORT => {
                let ingested = {
                    let mut store = self.store.lock().await;
                    handlers::handle_report(&mut store, message)
                };
                if let Some(metric) = ingested {
                    self.forward(metric);
                }
                None
            }
            METRIC_QUERY_RAW => {
                let store = self.store.lock().await;
                Some(handlers::handle_raw_query(&store, message))
            }
            METRIC_QUERY_AGGREGATE => {
                let store = self.store.lock().await;
                Some(handlers::handle_aggregate_query(&store, message))
            }
            other => {
                debug!("Ignoring message '{}'", other);
                None
            }
        }
    }

    /// Subscribe to `bus` and serve messages one at a time until shutdown.
    pub async fn attach(self: &Arc<Self>, bus: &MessageBus) {
        let mut rx = bus.subscribe();
        let bus = bus.clone();
        let monitor = Arc::clone(self);
        let cancel = self.cancel.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    // Drain anything already queued before honoring shutdown.
                    biased;
                    received = rx.recv() => match received {
                        Ok(message) => {
                            if let Some(response) = monitor.handle_message(&message).await {
                                bus.emit(response);
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("Monitor lagged behind the bus, {} messages skipped", skipped);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = cancel.cancelled() => break,
                }
            }
            debug!("Monitor detached from bus");
        });

        if let Some(previous) = self.listener.lock().await.replace(handle) {
            previous.abort();
        }
    }

    /// Stop serving the bus and persist state if enabled. Never fails.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        if let Some(handle) = self.listener.lock().await.take() {
            if let Err(e) = handle.await {
                error!("Monitor listener ended abnormally: {}", e);
            }
        }

        if !self.config.save_locally {
            return;
        }

        let state = self.store.lock().await.state().clone();
        if let Err(e) = self.state_file.save(&state).await {
            error!(
                "Failed to save metrics to {}: {}",
                self.state_file.path().display(),
                e
            );
        }
    }

    /// Copy of everything currently held.
    pub async fn snapshot(&self) -> MetricStoreState {
        self.store.lock().await.state().clone()
    }

    fn forward(&self, metric: IngestedMetric) {
        if !self.config.upload_enabled {
            return;
        }
        let Some(sink) = self.sink.clone() else {
            return;
        };

        tokio::spawn(async move {
            if let Err(e) = sink
                .report(&metric.name, metric.timestamp, &metric.data)
                .await
            {
                warn!("Failed to upload metric '{}': {}", metric.name, e);
            }
        });
    }
}
