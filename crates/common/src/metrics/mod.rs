//! Metrics and observability utilities
//!
//! Prometheus metrics with standardized naming conventions for the
//! catalog service.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all Lendstack metrics
pub const METRICS_PREFIX: &str = "lendstack";

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Loan metrics
    describe_counter!(
        format!("{}_renewals_total", METRICS_PREFIX),
        Unit::Count,
        "Renewal attempts by outcome"
    );

    // Catalog metrics
    describe_counter!(
        format!("{}_catalog_writes_total", METRICS_PREFIX),
        Unit::Count,
        "Create/update/delete operations on catalog records"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Record the outcome of a renewal attempt
pub fn record_renewal(outcome: &'static str) {
    counter!(
        format!("{}_renewals_total", METRICS_PREFIX),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a management write on a catalog record type
pub fn record_catalog_write(record: &'static str, operation: &'static str) {
    counter!(
        format!("{}_catalog_writes_total", METRICS_PREFIX),
        "record" => record,
        "operation" => operation
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_metrics() {
        let metrics = RequestMetrics::start("GET", "/catalog/books");
        std::thread::sleep(std::time::Duration::from_millis(10));
        metrics.finish(200);
        // Just verify it runs without panic
    }

    #[test]
    fn test_renewal_counter() {
        record_renewal("accepted");
        record_renewal("rejected");
    }
}
