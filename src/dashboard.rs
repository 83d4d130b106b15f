//! Terminal rendering of the stored tables.
//!
//! Every table is optional: a table that has never been written reads as empty and the
//! dashboard shows a hint instead of failing.

use chrono::DateTime;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use crate::app::ports::{Row, TableStorePort};
use crate::app::TableNames;
use crate::constants::{
    CHECK_NAME_COLUMN, CHECK_TIMESTAMP_COLUMN, DESCRIPTION_COLUMN, LATITUDE_FIELD,
    LONGITUDE_FIELD, PASSED_COLUMN, STATE_FIELD,
};
use crate::domain::Record;
use crate::pipeline::processing::quality_gate::QualityGateConfig;

/// One row of the quality table as the dashboard reads it
#[derive(Debug, Clone, PartialEq)]
pub struct CheckRow {
    pub name: String,
    pub passed: bool,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QualityPanel {
    /// Formatted time of the last evaluation, if any was stored
    pub last_run: Option<String>,
    pub checks: Vec<CheckRow>,
}

impl QualityPanel {
    pub fn from_rows(rows: &[Row]) -> Self {
        let last_run = rows
            .first()
            .and_then(|row| row.get(CHECK_TIMESTAMP_COLUMN))
            .map(format_timestamp);
        let checks = rows
            .iter()
            .map(|row| CheckRow {
                name: display_value(row.get(CHECK_NAME_COLUMN)),
                passed: row.get(PASSED_COLUMN).is_some_and(is_truthy),
                description: display_value(row.get(DESCRIPTION_COLUMN)),
            })
            .collect();
        Self { last_run, checks }
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

/// Key figures for one brewery table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetSummary {
    pub total: usize,
    pub distinct_states: usize,
    pub distinct_types: usize,
    /// Rows per type, largest first, ties broken by name
    pub type_counts: Vec<(String, usize)>,
    /// Rows with both latitude and longitude present
    pub mappable: usize,
}

impl DatasetSummary {
    pub fn from_rows(rows: &[Row], category_field: &str) -> Self {
        let distinct = |field: &str| {
            rows.iter()
                .filter_map(|row| non_null(row, field))
                .map(|v| display_value(Some(v)))
                .collect::<BTreeSet<_>>()
                .len()
        };

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for value in rows.iter().filter_map(|row| non_null(row, category_field)) {
            *counts.entry(display_value(Some(value))).or_default() += 1;
        }
        let mut type_counts: Vec<(String, usize)> = counts.into_iter().collect();
        type_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mappable = rows
            .iter()
            .filter(|row| {
                non_null(row, LATITUDE_FIELD).is_some() && non_null(row, LONGITUDE_FIELD).is_some()
            })
            .count();

        Self {
            total: rows.len(),
            distinct_states: distinct(STATE_FIELD),
            distinct_types: distinct(category_field),
            type_counts,
            mappable,
        }
    }
}

/// Everything the dashboard shows, loaded from the three tables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dashboard {
    pub quality: QualityPanel,
    pub clean: DatasetSummary,
    pub raw: DatasetSummary,
}

impl Dashboard {
    pub async fn load(
        store: &dyn TableStorePort,
        tables: &TableNames,
        category_field: &str,
    ) -> anyhow::Result<Self> {
        let raw = store.load_table(&tables.raw).await?;
        let quality = store.load_table(&tables.quality).await?;
        let clean = store.load_table(&tables.clean).await?;
        Ok(Self::from_tables(&raw, &quality, &clean, category_field))
    }

    pub fn from_tables(raw: &[Row], quality: &[Row], clean: &[Row], category_field: &str) -> Self {
        Self {
            quality: QualityPanel::from_rows(quality),
            clean: DatasetSummary::from_rows(clean, category_field),
            raw: DatasetSummary::from_rows(raw, category_field),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "🍺 Brewery Data Dashboard");
        let _ = writeln!(out);
        let _ = writeln!(out, "📊 Data Quality Monitoring");

        if self.quality.is_empty() {
            let _ = writeln!(
                out,
                "⚠️  No data quality results found. Run the pipeline to generate them."
            );
        } else {
            if let Some(last_run) = &self.quality.last_run {
                let _ = writeln!(out, "Last DQ Check Run: {}", last_run);
            }
            for check in &self.quality.checks {
                let status = if check.passed { "✅ PASS" } else { "❌ FAIL" };
                let _ = writeln!(out, "  {} {}", status, check.name);
                let _ = writeln!(out, "      {}", check.description);
            }
        }
        let _ = writeln!(out, "{}", "-".repeat(40));

        if self.raw.total == 0 || self.clean.total == 0 {
            let _ = writeln!(out, "No brewery data found. Run the pipeline to load data.");
            return out;
        }

        render_dataset(&mut out, "✨ Clean Dataset", &self.clean, true);
        render_dataset(&mut out, "Raw Dataset (Unfiltered)", &self.raw, false);
        out
    }
}

fn render_dataset(out: &mut String, title: &str, summary: &DatasetSummary, show_map: bool) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "  Total breweries:         {}", summary.total);
    let _ = writeln!(out, "  Number of states:        {}", summary.distinct_states);
    let _ = writeln!(out, "  Number of brewery types: {}", summary.distinct_types);
    if show_map {
        if summary.mappable > 0 {
            let _ = writeln!(out, "  With map coordinates:    {}", summary.mappable);
        } else {
            let _ = writeln!(out, "  No breweries with valid location data to display on the map.");
        }
    }
    let _ = writeln!(out, "  Breweries by type:");
    for (kind, count) in &summary.type_counts {
        let _ = writeln!(out, "    {:<12} {}", kind, count);
    }
}

/// Raw row whose category is present but not accepted
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidTypeRow {
    pub id: String,
    pub name: String,
    pub brewery_type: String,
    pub city: String,
    pub state: String,
}

/// Audit raw rows for categories outside the accepted set. Rows without a category are
/// not listed.
pub fn find_invalid_types(rows: &[Row], config: &QualityGateConfig) -> Vec<InvalidTypeRow> {
    rows.iter()
        .filter_map(|row| {
            let record = Record::from_value(&Value::Object(row.clone()), &config.category_field);
            let category = record.category?;
            if config.accepts(&category) {
                return None;
            }
            Some(InvalidTypeRow {
                id: display_value(row.get("id")),
                name: display_value(row.get("name")),
                brewery_type: category,
                city: display_value(row.get("city")),
                state: display_value(row.get(STATE_FIELD)),
            })
        })
        .collect()
}

pub fn render_invalid_types(rows: &[InvalidTypeRow]) -> String {
    let mut out = String::new();
    if rows.is_empty() {
        let _ = writeln!(
            out,
            "Success: No rows with invalid brewery types were found in the raw table."
        );
        return out;
    }
    let _ = writeln!(
        out,
        "Found the following rows with brewery types not in the accepted list:"
    );
    let _ = writeln!(
        out,
        "{:<38} {:<32} {:<14} {:<20} {}",
        "id", "name", "brewery_type", "city", "state"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:<38} {:<32} {:<14} {:<20} {}",
            row.id, row.name, row.brewery_type, row.city, row.state
        );
    }
    out
}

fn non_null<'a>(row: &'a Row, field: &str) -> Option<&'a Value> {
    row.get(field).filter(|v| !v.is_null())
}

fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.trim(), "1" | "true" | "True"),
        _ => false,
    }
}

fn format_timestamp(value: &Value) -> String {
    let text = display_value(Some(value));
    match DateTime::parse_from_rfc3339(&text) {
        Ok(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
        Err(_) => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CATEGORY_FIELD;
    use crate::infra::memory_store::InMemoryTableStore;
    use serde_json::json;

    fn rows(values: Vec<Value>) -> Vec<Row> {
        values
            .into_iter()
            .filter_map(|v| v.as_object().cloned())
            .collect()
    }

    #[tokio::test]
    async fn test_missing_tables_render_hints() {
        let store = InMemoryTableStore::new();
        let dashboard = Dashboard::load(&store, &TableNames::default(), CATEGORY_FIELD)
            .await
            .unwrap();
        assert_eq!(dashboard, Dashboard::default());

        let text = dashboard.render();
        assert!(text.contains("No data quality results found"));
        assert!(text.contains("No brewery data found"));
    }

    #[test]
    fn test_quality_panel() {
        let panel = QualityPanel::from_rows(&rows(vec![
            json!({ "check_name": "ID Not Null", "passed": 1, "description": "ok", "check_timestamp": "2025-03-04T05:06:07.000000Z" }),
            json!({ "check_name": "ID is Unique", "passed": 0, "description": "Found 2 duplicate ids.", "check_timestamp": "2025-03-04T05:06:07.000000Z" }),
        ]));
        assert_eq!(panel.last_run.as_deref(), Some("2025-03-04 05:06:07"));
        assert!(panel.checks[0].passed);
        assert!(!panel.checks[1].passed);
        assert_eq!(panel.checks[1].description, "Found 2 duplicate ids.");
    }

    #[test]
    fn test_dataset_summary() {
        let summary = DatasetSummary::from_rows(
            &rows(vec![
                json!({ "state": "Ohio", "brewery_type": "micro", "latitude": 40.1, "longitude": "-82.9" }),
                json!({ "state": "Ohio", "brewery_type": "brewpub", "latitude": null, "longitude": "-82.9" }),
                json!({ "state": "Utah", "brewery_type": "micro" }),
                json!({ "state": null, "brewery_type": "nano", "latitude": 1.0, "longitude": 2.0 }),
            ]),
            CATEGORY_FIELD,
        );
        assert_eq!(summary.total, 4);
        assert_eq!(summary.distinct_states, 2);
        assert_eq!(summary.distinct_types, 3);
        assert_eq!(summary.mappable, 2);
        assert_eq!(
            summary.type_counts,
            vec![
                ("micro".to_string(), 2),
                ("brewpub".to_string(), 1),
                ("nano".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_render_with_data() {
        let raw = rows(vec![
            json!({ "id": "a", "state": "Ohio", "brewery_type": "micro" }),
            json!({ "id": "b", "state": "Utah", "brewery_type": "bogus" }),
        ]);
        let clean = rows(vec![json!({ "id": "a", "state": "Ohio", "brewery_type": "micro" })]);
        let quality = rows(vec![json!({
            "check_name": "Brewery Type is Valid",
            "passed": 0,
            "description": "Found 1 brewery types not in the accepted list.",
            "check_timestamp": "2025-01-01T00:00:00Z"
        })]);
        let text = Dashboard::from_tables(&raw, &quality, &clean, CATEGORY_FIELD).render();
        assert!(text.contains("❌ FAIL Brewery Type is Valid"));
        assert!(text.contains("Clean Dataset"));
        assert!(text.contains("Raw Dataset (Unfiltered)"));
        assert!(text.contains("No breweries with valid location data"));
    }

    #[test]
    fn test_find_invalid_types() {
        let raw = rows(vec![
            json!({ "id": "a", "name": "Good", "brewery_type": "micro", "city": "Austin", "state": "Texas" }),
            json!({ "id": "b", "name": "Odd", "brewery_type": "taproom", "city": "Reno", "state": "Nevada" }),
            json!({ "id": "c", "name": "Unknown", "brewery_type": null }),
        ]);
        let invalid = find_invalid_types(&raw, &QualityGateConfig::default());
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].id, "b");
        assert_eq!(invalid[0].brewery_type, "taproom");
        assert!(render_invalid_types(&invalid).contains("taproom"));
        assert!(render_invalid_types(&[]).starts_with("Success"));
    }
}
