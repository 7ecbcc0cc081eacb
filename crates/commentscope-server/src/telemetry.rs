//! Logging and metrics bootstrap

use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

/// Initialize tracing/logging
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("commentscope=debug,tower_http=debug")
    } else {
        // Matches every commentscope_* crate
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("commentscope=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Install the Prometheus recorder and return the handle used by `/metrics`
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "commentscope_predictions_total",
        "Total number of validated prediction requests"
    );
    metrics::describe_counter!(
        "commentscope_field_outcomes_total",
        "Per-field prediction outcomes by field and outcome kind"
    );
    metrics::describe_histogram!(
        "commentscope_inference_latency_us",
        metrics::Unit::Microseconds,
        "Model inference latency in microseconds by model"
    );
    metrics::describe_counter!(
        "commentscope_history_writes_total",
        "Total number of history file writes"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
