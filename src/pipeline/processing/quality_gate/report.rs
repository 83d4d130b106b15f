use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::RuleResult;
use crate::constants::{
    CHECK_NAME_COLUMN, CHECK_TIMESTAMP_COLUMN, DESCRIPTION_COLUMN, PASSED_COLUMN,
};

/// Ordered rule outcomes from one evaluation run, stamped with the time the report was built
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub results: Vec<RuleResult>,
    pub generated_at: DateTime<Utc>,
}

impl QualityReport {
    /// Wrap rule results, capturing the current time once for the whole report
    pub fn build(results: Vec<RuleResult>) -> Self {
        Self::at(results, Utc::now())
    }

    pub fn at(results: Vec<RuleResult>, generated_at: DateTime<Utc>) -> Self {
        Self {
            results,
            generated_at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.passed_count()
    }

    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    /// Rows for the quality table; every row carries the same timestamp
    pub fn to_rows(&self) -> Vec<Map<String, Value>> {
        let timestamp = self
            .generated_at
            .to_rfc3339_opts(SecondsFormat::Micros, true);
        self.results
            .iter()
            .map(|result| {
                let mut row = Map::new();
                row.insert(CHECK_NAME_COLUMN.to_string(), json!(result.name));
                row.insert(PASSED_COLUMN.to_string(), json!(i64::from(result.passed)));
                row.insert(DESCRIPTION_COLUMN.to_string(), json!(result.description));
                row.insert(CHECK_TIMESTAMP_COLUMN.to_string(), json!(timestamp));
                row
            })
            .collect()
    }
}
