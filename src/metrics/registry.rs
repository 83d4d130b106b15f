//! Metrics registry for coordinating phase-specific metrics

use crate::metrics::{MetricDoc, PhaseMetrics};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

/// Register all metrics from all phases, warning about name conflicts
pub fn register_all_metrics() -> usize {
    let mut all_metrics = HashMap::new();

    register_phase_metrics::<super::ingest::IngestMetrics>(&mut all_metrics);
    register_phase_metrics::<super::quality::QualityMetrics>(&mut all_metrics);

    info!(
        "Registered {} total metrics across all phases",
        all_metrics.len()
    );

    if std::env::var("BREWERY_METRICS_DEBUG").is_ok() {
        log_metrics_summary(&all_metrics);
    }
    all_metrics.len()
}

fn register_phase_metrics<T: PhaseMetrics>(all_metrics: &mut HashMap<String, MetricDoc>) {
    T::register_metrics();
    let phase_docs = T::metrics_documentation();
    let phase_name = T::phase_name();

    info!(
        "Registering {} metrics for phase '{}'",
        phase_docs.len(),
        phase_name
    );

    for doc in phase_docs {
        if all_metrics.contains_key(doc.name) {
            warn!(
                "Metric name conflict detected: '{}' is defined twice (phase '{}')",
                doc.name, phase_name
            );
        } else {
            all_metrics.insert(doc.name.to_string(), doc);
        }
    }
}

fn log_metrics_summary(all_metrics: &HashMap<String, MetricDoc>) {
    info!("=== Metrics Registry Summary ===");

    for (phase, docs) in group_by_phase(all_metrics.values()) {
        info!("Phase '{}': {} metrics", phase, docs.len());
        for doc in docs {
            info!(
                "  - {} ({:?}, labels {:?}): {}",
                doc.name, doc.metric_type, doc.labels, doc.help
            );
        }
    }

    info!("=== End Metrics Summary ===");
}

/// Group metric docs by the phase encoded in their name, sorted by phase then name
fn group_by_phase<'a>(
    docs: impl IntoIterator<Item = &'a MetricDoc>,
) -> BTreeMap<&'a str, Vec<&'a MetricDoc>> {
    let mut by_phase: BTreeMap<&str, Vec<&MetricDoc>> = BTreeMap::new();
    for doc in docs {
        let phase = extract_phase_from_metric_name(doc.name);
        by_phase.entry(phase).or_default().push(doc);
    }
    for docs in by_phase.values_mut() {
        docs.sort_by_key(|doc| doc.name);
    }
    by_phase
}

/// Extract phase name from metric name (e.g., "brewery_ingest_pages_fetched_total" -> "ingest")
fn extract_phase_from_metric_name(metric_name: &str) -> &str {
    if let Some(stripped) = metric_name.strip_prefix("brewery_") {
        if let Some(next_underscore) = stripped.find('_') {
            return &stripped[..next_underscore];
        }
    }
    "unknown"
}
