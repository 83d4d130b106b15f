use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

use super::{latitude_in_range, QualityGate};
use crate::domain::Record;

/// Records dropped by each corrective filter, attributed to the first filter that removed them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DropCounts {
    pub missing_id: usize,
    pub duplicate_id: usize,
    pub latitude_out_of_range: usize,
    pub invalid_category: usize,
}

impl DropCounts {
    pub fn total(&self) -> usize {
        self.missing_id + self.duplicate_id + self.latitude_out_of_range + self.invalid_category
    }
}

/// The records that satisfy every quality rule, in input order
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRecordSet {
    records: Vec<Record>,
    original_count: usize,
    drops: DropCounts,
}

impl CleanRecordSet {
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Size of the collection the set was derived from
    pub fn original_count(&self) -> usize {
        self.original_count
    }

    pub fn drops(&self) -> DropCounts {
        self.drops
    }

    /// Rows for the clean table: original attributes with latitude coerced
    pub fn to_rows(&self) -> Vec<Map<String, Value>> {
        self.records.iter().map(Record::cleaned).collect()
    }
}

impl QualityGate {
    /// Derive the clean subset of `records`.
    ///
    /// Filters run in order: missing id, duplicate id (first seen wins), latitude out of
    /// range, category not accepted. Duplicate detection only sees records that still
    /// have an id, so absent ids are never duplicates of each other.
    #[instrument(skip(self, records), fields(record_count = records.len()))]
    pub fn clean(&self, records: &[Record]) -> CleanRecordSet {
        let mut drops = DropCounts::default();
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(records.len());

        for record in records {
            let Some(id) = record.id.as_ref() else {
                drops.missing_id += 1;
                continue;
            };
            if !seen.insert(id) {
                drops.duplicate_id += 1;
                continue;
            }
            if !latitude_in_range(record) {
                drops.latitude_out_of_range += 1;
                continue;
            }
            let accepted = record
                .category
                .as_deref()
                .is_some_and(|c| self.config().accepts(c));
            if !accepted {
                drops.invalid_category += 1;
                continue;
            }
            kept.push(record.clone());
        }

        info!(
            "Original row count: {}. Cleaned row count: {}.",
            records.len(),
            kept.len()
        );
        debug!(?drops, "Cleaning drop breakdown");

        CleanRecordSet {
            records: kept,
            original_count: records.len(),
            drops,
        }
    }
}
