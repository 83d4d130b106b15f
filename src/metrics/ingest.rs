//! Ingest Phase Metrics
//!
//! Pagination progress and fetch timing for the upstream API.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

/// Metrics collection for the ingest phase
pub struct IngestMetrics;

impl IngestMetrics {
    /// Record one non-empty page
    pub fn record_page(records: usize) {
        ::metrics::counter!(phase_metric!(counter, "ingest", "pages_fetched")).increment(1);
        ::metrics::counter!(phase_metric!(counter, "ingest", "records_fetched"))
            .increment(records as u64);
    }

    /// Record a completed fetch of the whole dataset
    pub fn record_fetch_complete(total_records: usize, duration_secs: f64) {
        ::metrics::histogram!(phase_metric!(histogram, "ingest", "fetch_duration_seconds"))
            .record(duration_secs);
        ::metrics::gauge!(phase_metric!(gauge, "ingest", "last_fetch_records"))
            .set(total_records as f64);
    }

    /// Record a fetch that aborted the run
    pub fn record_fetch_error(status: u16) {
        ::metrics::counter!(
            phase_metric!(counter, "ingest", "fetch_errors"),
            "status" => status.to_string()
        )
        .increment(1);
    }
}

impl PhaseMetrics for IngestMetrics {
    fn register_metrics() {
        use metrics::{counter, gauge, histogram};

        let _ = counter!(phase_metric!(counter, "ingest", "pages_fetched"));
        let _ = counter!(phase_metric!(counter, "ingest", "records_fetched"));
        let _ = counter!(phase_metric!(counter, "ingest", "fetch_errors"));
        let _ = histogram!(phase_metric!(histogram, "ingest", "fetch_duration_seconds"));
        let _ = gauge!(phase_metric!(gauge, "ingest", "last_fetch_records"));
    }

    fn phase_name() -> &'static str {
        "ingest"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "ingest", "pages_fetched"),
                metric_type: MetricType::Counter,
                help: "Total number of non-empty pages fetched from the API",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "ingest", "records_fetched"),
                metric_type: MetricType::Counter,
                help: "Total number of raw records fetched from the API",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "ingest", "fetch_errors"),
                metric_type: MetricType::Counter,
                help: "Fetches that aborted a run",
                labels: vec!["status"],
            },
            MetricDoc {
                name: phase_metric!(histogram, "ingest", "fetch_duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Time taken to page through the whole dataset",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(gauge, "ingest", "last_fetch_records"),
                metric_type: MetricType::Gauge,
                help: "Number of records returned by the most recent fetch",
                labels: vec![],
            },
        ]
    }
}
