use anyhow::Result;
use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Metrics collection and management
#[derive(Debug, Clone, Copy)]
pub struct MetricsCollector {
    // Database metrics
    pub db_operations_total: &'static str,
    pub db_operation_duration: &'static str,
    pub db_connection_pool_size: &'static str,

    // HTTP metrics
    pub http_requests_total: &'static str,
    pub http_request_duration: &'static str,

    // Error metrics
    pub errors_total: &'static str,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            db_operations_total: "review_pulse_db_operations_total",
            db_operation_duration: "review_pulse_db_operation_duration_seconds",
            db_connection_pool_size: "review_pulse_db_connection_pool_size",

            http_requests_total: "review_pulse_http_requests_total",
            http_request_duration: "review_pulse_http_request_duration_seconds",

            errors_total: "review_pulse_errors_total",
        }
    }
}

impl MetricsCollector {
    /// Initialize metrics collection
    pub fn init() -> Result<()> {
        // Install a recorder up front; a real exporter can replace this later
        metrics::set_global_recorder(metrics::NoopRecorder)
            .map_err(|e| anyhow::anyhow!("Failed to initialize metrics recorder: {}", e))?;

        Ok(())
    }

    /// Record database operation metrics
    pub fn record_db_operation(&self, operation: &str, duration: Duration, success: bool) {
        let status = if success { "success" } else { "error" };

        counter!(
            self.db_operations_total,
            "operation" => operation.to_string(),
            "status" => status
        )
        .increment(1);
        histogram!(
            self.db_operation_duration,
            "operation" => operation.to_string()
        )
        .record(duration.as_secs_f64());

        if !success {
            counter!(self.errors_total, "type" => "database").increment(1);
        }
    }

    /// Record an HTTP request outcome
    pub fn record_http_request(&self, route: &str, status: u16, duration: Duration) {
        counter!(
            self.http_requests_total,
            "route" => route.to_string(),
            "status" => status.to_string()
        )
        .increment(1);
        histogram!(
            self.http_request_duration,
            "route" => route.to_string()
        )
        .record(duration.as_secs_f64());
    }

    /// Record error metrics
    pub fn record_error(&self, error_type: &str, operation: &str) {
        counter!(
            self.errors_total,
            "type" => error_type.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
    }

    /// Update connection pool size
    pub fn update_connection_pool_size(&self, size: usize) {
        #[allow(clippy::cast_precision_loss)]
        gauge!(self.db_connection_pool_size).set(size as f64);
    }
}

/// Performance timing wrapper for metrics
pub struct QueryTimer {
    collector: MetricsCollector,
    operation: String,
    start: std::time::Instant,
}

impl QueryTimer {
    pub fn new(collector: MetricsCollector, operation: &str) -> Self {
        Self {
            collector,
            operation: operation.to_string(),
            start: std::time::Instant::now(),
        }
    }

    pub fn finish(self, success: bool) {
        let duration = self.start.elapsed();
        self.collector
            .record_db_operation(&self.operation, duration, success);
    }
}
