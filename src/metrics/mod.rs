//! Metrics for the brewery pipeline
//!
//! Each pipeline phase defines its metrics in a dedicated submodule so names stay
//! consistent and conflicts are caught when the registry runs at startup.

pub mod ingest;
pub mod quality;
pub mod registry;

pub use ingest::IngestMetrics;
pub use quality::QualityMetrics;

use std::sync::Once;
use tracing::{info, warn};

static INIT: Once = Once::new();

/// Environment variable holding the Prometheus listen address
pub const METRICS_ADDR_ENV: &str = "BREWERY_METRICS_ADDR";

/// Initialize the global metrics infrastructure
///
/// Idempotent. Installs a Prometheus recorder with an HTTP listener when
/// `BREWERY_METRICS_ADDR` is set; without it every metric call is a no-op.
pub fn init_metrics() {
    INIT.call_once(|| {
        let addr_str = match std::env::var(METRICS_ADDR_ENV) {
            Ok(v) if !v.trim().is_empty() => v,
            _ => {
                info!("{} not set, metrics exporter disabled", METRICS_ADDR_ENV);
                return;
            }
        };

        let addr = match addr_str.trim().parse::<std::net::SocketAddr>() {
            Ok(addr) => addr,
            Err(e) => {
                warn!("Invalid metrics addr '{}': {}", addr_str, e);
                return;
            }
        };

        match metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
        {
            Ok(()) => {
                info!("Prometheus HTTP exporter started at http://{}/metrics", addr);
                registry::register_all_metrics();
            }
            Err(e) => {
                warn!("Failed to install Prometheus recorder: {}", e);
            }
        }
    });
}

/// Trait for phase-specific metrics collections
pub trait PhaseMetrics {
    /// Register all metrics for this phase
    fn register_metrics();

    /// Get the phase name for prefixing metrics
    fn phase_name() -> &'static str;

    /// Get documentation for all metrics in this phase
    fn metrics_documentation() -> Vec<MetricDoc>;
}

/// Documentation for a single metric
#[derive(Debug, Clone)]
pub struct MetricDoc {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub help: &'static str,
    pub labels: Vec<&'static str>,
}

#[derive(Debug, Clone)]
pub enum MetricType {
    Counter,
    Histogram,
    Gauge,
}

/// Build a metric name following `brewery_{phase}_{metric_name}[_total]`
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("brewery_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("brewery_", $phase, "_", $name)
    };
    (gauge, $phase:literal, $name:literal) => {
        concat!("brewery_", $phase, "_", $name)
    };
}

pub(crate) use phase_metric;
