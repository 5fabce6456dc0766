//! Observability utilities for the todo service.
//!
//! This crate provides:
//! - Prometheus metrics recording and export
//! - Custom metrics for todo store operations and persistence
//! - Axum middleware for automatic request metrics
//!
//! # Example
//!
//! ```rust,ignore
//! use observability::{init_metrics, metrics_handler, TodoMetrics};
//!
//! // Initialize metrics recorder
//! init_metrics()?;
//!
//! // Record store operations
//! TodoMetrics::record_operation("create");
//! TodoMetrics::set_todo_counts(12, 4);
//!
//! // Add metrics endpoint to router
//! let app = Router::new()
//!     .route("/metrics", get(metrics_handler));
//! ```

pub mod middleware;
pub mod todos;

pub use middleware::metrics_middleware;
pub use todos::TodoMetrics;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Initialize the Prometheus metrics recorder.
///
/// Call once at application startup; later calls return the existing handle.
///
/// # Errors
/// Fails if another global metrics recorder was already installed.
pub fn init_metrics() -> Result<&'static PrometheusHandle, BuildError> {
    METRICS_HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new().install_recorder()?;

        info!("Prometheus metrics recorder initialized");

        register_metric_descriptions();

        Ok(handle)
    })
}

/// Get the metrics handle (must call init_metrics first)
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Axum handler for /metrics endpoint
pub async fn metrics_handler() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

/// Register metric descriptions for documentation
fn register_metric_descriptions() {
    use metrics::describe_counter;
    use metrics::describe_gauge;
    use metrics::describe_histogram;

    // HTTP metrics
    describe_counter!("http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "http_requests_errors_total",
        "Total number of HTTP request errors"
    );

    // Todo store metrics
    describe_counter!(
        "todo_operations_total",
        "Successful todo mutations by operation"
    );
    describe_counter!(
        "todo_flush_failures_total",
        "Failed writes of the todo snapshot to disk"
    );
    describe_histogram!(
        "todo_flush_duration_seconds",
        "Time spent writing the todo snapshot to disk"
    );
    describe_gauge!("todos_total", "Number of todos currently stored");
    describe_gauge!("todos_completed", "Number of completed todos currently stored");
}
