use std::sync::Arc;

use axum::extract::State;
use metrics_exporter_prometheus::PrometheusHandle;

/// GET /metrics — label, extraction and batch counters in Prometheus text format.
pub async fn prometheus_metrics(State(handle): State<Arc<PrometheusHandle>>) -> String {
    handle.render()
}

/// Register descriptions for the metrics the pipeline and batch runner emit.
pub fn describe_metrics() {
    ::metrics::describe_counter!(
        "label_verifications_total",
        "Labels verified, by overall status"
    );
    ::metrics::describe_histogram!(
        "label_verification_seconds",
        "Time to verify one label group"
    );
    ::metrics::describe_counter!(
        "extraction_passes_total",
        "Extraction provider calls, by pass"
    );
    ::metrics::describe_counter!("batches_started_total", "Batches accepted for processing");
    ::metrics::describe_counter!("batches_completed_total", "Batches that finished and were stored");
    ::metrics::describe_gauge!(
        "batch_store_snapshots",
        "Batch snapshots currently retained for export"
    );
}
