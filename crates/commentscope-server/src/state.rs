use commentscope_history::HistoryStore;
use commentscope_models::ModelRegistry;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Models loaded at startup, never mutated afterwards
    pub registry: Arc<ModelRegistry>,

    /// Prediction history
    pub history: Arc<HistoryStore>,

    /// Prometheus renderer, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(registry: ModelRegistry, history: HistoryStore) -> Self {
        Self {
            registry: Arc::new(registry),
            history: Arc::new(history),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
