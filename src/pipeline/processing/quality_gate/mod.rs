use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use tracing::{info, instrument, warn};

use crate::constants::{self, MAX_LATITUDE, MIN_LATITUDE};
use crate::domain::{RawRecord, Record};

pub mod cleaner;
pub mod report;

pub use cleaner::{CleanRecordSet, DropCounts};
pub use report::QualityReport;

/// The fixed set of quality rules, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum QualityRule {
    /// Every record carries an id
    IdPresent,
    /// No two records share an id
    IdUnique,
    /// Numeric latitudes lie in [-90, 90]
    LatitudeInRange,
    /// Every category value is in the accepted set
    CategoryValid,
}

impl QualityRule {
    pub const ALL: [QualityRule; 4] = [
        QualityRule::IdPresent,
        QualityRule::IdUnique,
        QualityRule::LatitudeInRange,
        QualityRule::CategoryValid,
    ];

    /// Name persisted in the quality table
    pub fn name(self) -> &'static str {
        match self {
            QualityRule::IdPresent => "ID Not Null",
            QualityRule::IdUnique => "ID is Unique",
            QualityRule::LatitudeInRange => "Latitude in Range",
            QualityRule::CategoryValid => "Brewery Type is Valid",
        }
    }

    fn count_violations(self, records: &[Record], config: &QualityGateConfig) -> usize {
        match self {
            QualityRule::IdPresent => records.iter().filter(|r| !has_id(r)).count(),
            QualityRule::IdUnique => {
                let mut seen = HashSet::new();
                records
                    .iter()
                    .filter_map(|r| r.id.as_ref())
                    .filter(|id| !seen.insert(*id))
                    .count()
            }
            QualityRule::LatitudeInRange => {
                records.iter().filter(|r| !latitude_in_range(r)).count()
            }
            // Distinct values, not occurrences. An absent category is not a value.
            QualityRule::CategoryValid => records
                .iter()
                .filter_map(|r| r.category.as_deref())
                .filter(|c| !config.accepts(c))
                .collect::<BTreeSet<_>>()
                .len(),
        }
    }

    fn describe(self, violations: usize) -> String {
        match (self, violations) {
            (QualityRule::IdPresent, 0) => {
                "Success: found 0 null values in the id column.".to_string()
            }
            (QualityRule::IdPresent, n) => format!("Found {} null values in the id column.", n),
            (QualityRule::IdUnique, 0) => "Success: found 0 duplicate ids.".to_string(),
            (QualityRule::IdUnique, n) => format!("Found {} duplicate ids.", n),
            (QualityRule::LatitudeInRange, 0) => {
                "Success: all valid latitudes are within the [-90, 90] range (0 outside)."
                    .to_string()
            }
            (QualityRule::LatitudeInRange, n) => {
                format!("Found {} latitudes outside the valid [-90, 90] range.", n)
            }
            (QualityRule::CategoryValid, 0) => {
                "Success: found 0 brewery types not in the accepted list.".to_string()
            }
            (QualityRule::CategoryValid, n) => {
                format!("Found {} brewery types not in the accepted list.", n)
            }
        }
    }

    /// Evaluate this rule over the whole collection
    pub fn evaluate(self, records: &[Record], config: &QualityGateConfig) -> RuleResult {
        let violations = self.count_violations(records, config);
        RuleResult {
            rule: self,
            name: self.name().to_string(),
            passed: violations == 0,
            violations,
            description: self.describe(violations),
        }
    }
}

/// Outcome of one rule over one record collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleResult {
    #[serde(skip)]
    pub rule: QualityRule,
    pub name: String,
    pub passed: bool,
    pub violations: usize,
    pub description: String,
}

/// Configuration for the quality rules
#[derive(Debug, Clone)]
pub struct QualityGateConfig {
    /// Category values accepted by the category rule
    pub accepted_categories: BTreeSet<String>,
    /// Name of the record field holding the category
    pub category_field: String,
}

impl QualityGateConfig {
    pub fn new<I>(accepted_categories: I, category_field: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            accepted_categories: accepted_categories.into_iter().collect(),
            category_field: category_field.into(),
        }
    }

    pub fn accepts(&self, category: &str) -> bool {
        self.accepted_categories.contains(category)
    }
}

impl Default for QualityGateConfig {
    fn default() -> Self {
        Self::new(
            constants::default_accepted_categories(),
            constants::CATEGORY_FIELD,
        )
    }
}

pub(crate) fn has_id(record: &Record) -> bool {
    record.id.is_some()
}

/// Absent latitude never violates the range rule
pub(crate) fn latitude_in_range(record: &Record) -> bool {
    record
        .latitude
        .map_or(true, |lat| (MIN_LATITUDE..=MAX_LATITUDE).contains(&lat))
}

/// Validates and cleans record collections against the fixed rule set
#[derive(Debug, Clone, Default)]
pub struct QualityGate {
    config: QualityGateConfig,
}

impl QualityGate {
    pub fn new(config: QualityGateConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QualityGateConfig {
        &self.config
    }

    /// Parse raw JSON values into typed records using the configured category field
    pub fn parse_records(&self, raw: &[RawRecord]) -> Vec<Record> {
        Record::from_values(raw, &self.config.category_field)
    }

    /// Run every rule in order. An empty collection yields no results.
    pub fn check(&self, records: &[Record]) -> Vec<RuleResult> {
        if records.is_empty() {
            return Vec::new();
        }
        QualityRule::ALL
            .iter()
            .map(|rule| rule.evaluate(records, &self.config))
            .collect()
    }

    /// Run every rule and wrap the results in a timestamped report
    #[instrument(skip(self, records), fields(record_count = records.len()))]
    pub fn evaluate(&self, records: &[Record]) -> QualityReport {
        let results = self.check(records);
        for result in &results {
            if result.passed {
                info!(rule = result.name.as_str(), "PASS: {}", result.description);
            } else {
                warn!(rule = result.name.as_str(), "FAIL: {}", result.description);
            }
        }
        QualityReport::build(results)
    }
}
