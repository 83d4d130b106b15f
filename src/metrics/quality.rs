//! Quality Phase Metrics
//!
//! Rule outcomes and cleaning volumes.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};
use crate::pipeline::processing::quality_gate::{CleanRecordSet, RuleResult};

/// Metrics collection for the quality phase
pub struct QualityMetrics;

impl QualityMetrics {
    /// Record the outcome of a single rule
    pub fn record_rule(result: &RuleResult) {
        ::metrics::counter!(
            phase_metric!(counter, "quality", "rules_evaluated"),
            "rule" => result.name.clone()
        )
        .increment(1);
        if !result.passed {
            ::metrics::counter!(
                phase_metric!(counter, "quality", "rules_failed"),
                "rule" => result.name.clone()
            )
            .increment(1);
        }
        ::metrics::gauge!(
            phase_metric!(gauge, "quality", "rule_violations"),
            "rule" => result.name.clone()
        )
        .set(result.violations as f64);
    }

    /// Record raw versus clean sizes for a run
    pub fn record_run(raw_records: usize, clean_records: usize) {
        ::metrics::counter!(phase_metric!(counter, "quality", "runs")).increment(1);
        ::metrics::gauge!(phase_metric!(gauge, "quality", "raw_records")).set(raw_records as f64);
        ::metrics::gauge!(phase_metric!(gauge, "quality", "clean_records"))
            .set(clean_records as f64);
        ::metrics::counter!(phase_metric!(counter, "quality", "records_dropped"))
            .increment(raw_records.saturating_sub(clean_records) as u64);
    }

    /// Record a full cleaning pass
    pub fn record_clean(clean: &CleanRecordSet) {
        Self::record_run(clean.original_count(), clean.len());
    }
}

impl PhaseMetrics for QualityMetrics {
    fn register_metrics() {
        use metrics::{counter, gauge};

        let _ = counter!(phase_metric!(counter, "quality", "rules_evaluated"));
        let _ = counter!(phase_metric!(counter, "quality", "rules_failed"));
        let _ = counter!(phase_metric!(counter, "quality", "runs"));
        let _ = counter!(phase_metric!(counter, "quality", "records_dropped"));
        let _ = gauge!(phase_metric!(gauge, "quality", "rule_violations"));
        let _ = gauge!(phase_metric!(gauge, "quality", "raw_records"));
        let _ = gauge!(phase_metric!(gauge, "quality", "clean_records"));
    }

    fn phase_name() -> &'static str {
        "quality"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "quality", "rules_evaluated"),
                metric_type: MetricType::Counter,
                help: "Rule evaluations performed",
                labels: vec!["rule"],
            },
            MetricDoc {
                name: phase_metric!(counter, "quality", "rules_failed"),
                metric_type: MetricType::Counter,
                help: "Rule evaluations that reported violations",
                labels: vec!["rule"],
            },
            MetricDoc {
                name: phase_metric!(counter, "quality", "runs"),
                metric_type: MetricType::Counter,
                help: "Cleaning passes performed",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "quality", "records_dropped"),
                metric_type: MetricType::Counter,
                help: "Records removed by the cleaner",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(gauge, "quality", "rule_violations"),
                metric_type: MetricType::Gauge,
                help: "Violation count reported by the latest evaluation of each rule",
                labels: vec!["rule"],
            },
            MetricDoc {
                name: phase_metric!(gauge, "quality", "raw_records"),
                metric_type: MetricType::Gauge,
                help: "Records in the latest raw collection",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(gauge, "quality", "clean_records"),
                metric_type: MetricType::Gauge,
                help: "Records surviving the latest cleaning pass",
                labels: vec![],
            },
        ]
    }
}
