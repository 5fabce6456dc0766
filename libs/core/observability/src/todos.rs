//! Todo store metrics.

use metrics::{counter, gauge, histogram};

/// Todo metrics recorder
pub struct TodoMetrics;

impl TodoMetrics {
    /// Record a successful store mutation (`create`, `update`, `toggle`,
    /// `delete`, `clear_completed`, `reorder`)
    pub fn record_operation(operation: &'static str) {
        counter!("todo_operations_total", "operation" => operation).increment(1);
    }

    /// Publish the current collection size
    pub fn set_todo_counts(total: usize, completed: usize) {
        gauge!("todos_total").set(total as f64);
        gauge!("todos_completed").set(completed as f64);
    }

    /// Record a snapshot write that reached the disk
    pub fn record_flush(duration_secs: f64) {
        histogram!("todo_flush_duration_seconds").record(duration_secs);

        tracing::debug!(duration_secs = duration_secs, "Todo snapshot flushed");
    }

    /// Record a snapshot write that failed; the in-memory state stays authoritative
    pub fn record_flush_failure() {
        counter!("todo_flush_failures_total").increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        TodoMetrics::record_operation("create");
        TodoMetrics::set_todo_counts(3, 1);
        TodoMetrics::record_flush(0.002);
        TodoMetrics::record_flush_failure();
    }
}
