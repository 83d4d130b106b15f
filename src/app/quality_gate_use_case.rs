use anyhow::Result;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::app::ports::{Row, TableStorePort};
use crate::config::StorageConfig;
use crate::domain::{RawRecord, Record};
use crate::metrics::QualityMetrics;
use crate::pipeline::processing::quality_gate::{
    CleanRecordSet, DropCounts, QualityGate, QualityReport,
};

/// Names under which the three outputs of a run are stored
#[derive(Debug, Clone)]
pub struct TableNames {
    pub raw: String,
    pub quality: String,
    pub clean: String,
}

impl From<&StorageConfig> for TableNames {
    fn from(storage: &StorageConfig) -> Self {
        Self {
            raw: storage.raw_table.clone(),
            quality: storage.quality_table.clone(),
            clean: storage.clean_table.clone(),
        }
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self::from(&StorageConfig::default())
    }
}

/// What one pipeline run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub raw_count: usize,
    pub clean_count: usize,
    pub drops: DropCounts,
    pub report: QualityReport,
}

impl RunSummary {
    pub fn rules_passed(&self) -> usize {
        self.report.passed_count()
    }

    pub fn rules_failed(&self) -> usize {
        self.report.failed_count()
    }
}

/// Runs the quality gate over one fetched collection and persists raw, quality and clean tables
pub struct QualityGateUseCase {
    quality_gate: QualityGate,
    store: Box<dyn TableStorePort>,
    tables: TableNames,
}

impl QualityGateUseCase {
    pub fn new(quality_gate: QualityGate, store: Box<dyn TableStorePort>, tables: TableNames) -> Self {
        Self {
            quality_gate,
            store,
            tables,
        }
    }

    pub fn tables(&self) -> &TableNames {
        &self.tables
    }

    /// Evaluate and clean without touching storage
    pub fn assess(&self, raw: &[RawRecord]) -> (QualityReport, CleanRecordSet) {
        let records = self.quality_gate.parse_records(raw);
        let report = self.quality_gate.evaluate(&records);
        let clean = self.quality_gate.clean(&records);
        (report, clean)
    }

    /// Persist the raw collection, its quality report and its clean subset.
    ///
    /// Each table is fully replaced. An empty collection writes nothing, so tables from
    /// the previous run stay in place.
    #[instrument(skip(self, raw), fields(record_count = raw.len()))]
    pub async fn run(&self, raw: &[RawRecord]) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();

        if raw.is_empty() {
            info!(%run_id, "No raw data to save.");
            return Ok(RunSummary {
                run_id,
                raw_count: 0,
                clean_count: 0,
                drops: DropCounts::default(),
                report: QualityReport::build(Vec::new()),
            });
        }

        let records = self.quality_gate.parse_records(raw);

        let raw_rows: Vec<Row> = records.iter().map(|r| r.raw().clone()).collect();
        self.store.replace_table(&self.tables.raw, &raw_rows).await?;
        info!(
            "Successfully saved {} raw records to '{}' table.",
            raw_rows.len(),
            self.tables.raw
        );

        let report = self.quality_gate.evaluate(&records);
        for result in &report.results {
            QualityMetrics::record_rule(result);
        }
        self.store
            .replace_table(&self.tables.quality, &report.to_rows())
            .await?;
        info!("Successfully saved {} quality checks.", report.len());

        let clean = self.clean_and_save(&records).await?;

        Ok(RunSummary {
            run_id,
            raw_count: records.len(),
            clean_count: clean.len(),
            drops: clean.drops(),
            report,
        })
    }

    async fn clean_and_save(&self, records: &[Record]) -> Result<CleanRecordSet> {
        let clean = self.quality_gate.clean(records);
        QualityMetrics::record_clean(&clean);
        self.store
            .replace_table(&self.tables.clean, &clean.to_rows())
            .await?;
        info!(
            "Successfully saved {} clean records to '{}' table.",
            clean.len(),
            self.tables.clean
        );
        Ok(clean)
    }
}
