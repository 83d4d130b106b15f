//! Property-based tests for the quality rules and the cleaner using proptest.

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use brewery_quality::constants::{ACCEPTED_BREWERY_TYPES, MAX_LATITUDE, MIN_LATITUDE};
use brewery_quality::domain::Record;
use brewery_quality::pipeline::processing::quality_gate::{QualityGate, QualityRule};

/// `None` leaves the key out of the object entirely
fn id_strategy() -> impl Strategy<Value = Option<Value>> {
    prop_oneof![
        Just(None),
        Just(Some(Value::Null)),
        "[a-d]".prop_map(|s| Some(json!(s))),
        (0i64..5).prop_map(|n| Some(json!(n))),
        (0i64..5).prop_map(|n| Some(json!(n as f64))),
    ]
}

fn category_strategy() -> impl Strategy<Value = Option<Value>> {
    prop_oneof![
        Just(None),
        Just(Some(Value::Null)),
        prop::sample::select(ACCEPTED_BREWERY_TYPES.to_vec()).prop_map(|c| Some(json!(c))),
        "[x-z]{1,3}".prop_map(|c| Some(json!(c))),
    ]
}

fn latitude_strategy() -> impl Strategy<Value = Option<Value>> {
    prop_oneof![
        Just(None),
        Just(Some(Value::Null)),
        (-200.0f64..200.0).prop_map(|l| Some(json!(l))),
        (-200i32..200).prop_map(|l| Some(json!(l.to_string()))),
        Just(Some(json!("n/a"))),
        Just(Some(json!(true))),
    ]
}

fn record_strategy() -> impl Strategy<Value = Value> {
    (id_strategy(), category_strategy(), latitude_strategy(), "[A-Za-z ]{0,12}").prop_map(
        |(id, category, latitude, name)| {
            let mut object = Map::new();
            object.insert("name".to_string(), json!(name));
            if let Some(id) = id {
                object.insert("id".to_string(), id);
            }
            if let Some(category) = category {
                object.insert("brewery_type".to_string(), category);
            }
            if let Some(latitude) = latitude {
                object.insert("latitude".to_string(), latitude);
            }
            Value::Object(object)
        },
    )
}

fn dataset_strategy() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(record_strategy(), 0..40)
}

fn parse(values: &[Value]) -> Vec<Record> {
    QualityGate::default().parse_records(values)
}

// --- Rule evaluator properties ---

proptest! {
    #[test]
    fn evaluation_yields_all_rules_in_order_or_nothing(values in dataset_strategy()) {
        let records = parse(&values);
        let report = QualityGate::default().evaluate(&records);
        let order: Vec<QualityRule> = report.results.iter().map(|r| r.rule).collect();
        if records.is_empty() {
            prop_assert!(order.is_empty());
        } else {
            prop_assert_eq!(order, QualityRule::ALL.to_vec());
        }
        for result in &report.results {
            prop_assert_eq!(result.passed, result.violations == 0);
        }
    }

    #[test]
    fn evaluation_is_deterministic(values in dataset_strategy()) {
        let gate = QualityGate::default();
        let records = parse(&values);
        prop_assert_eq!(gate.check(&records), gate.check(&records));
    }
}

// --- Cleaner properties ---

proptest! {
    #[test]
    fn cleaning_never_grows_the_collection(values in dataset_strategy()) {
        let clean = QualityGate::default().clean(&parse(&values));
        prop_assert!(clean.len() <= values.len());
        prop_assert_eq!(clean.original_count(), values.len());
        prop_assert_eq!(clean.original_count() - clean.len(), clean.drops().total());
    }

    #[test]
    fn survivors_satisfy_every_rule(values in dataset_strategy()) {
        let gate = QualityGate::default();
        let clean = gate.clean(&parse(&values));

        for record in clean.records() {
            prop_assert!(record.id.is_some());
            prop_assert!(record
                .latitude
                .map_or(true, |l| (MIN_LATITUDE..=MAX_LATITUDE).contains(&l)));
            prop_assert!(record
                .category
                .as_deref()
                .is_some_and(|c| gate.config().accepts(c)));
        }
        prop_assert!(gate.check(clean.records()).iter().all(|r| r.passed));
    }

    #[test]
    fn cleaning_is_idempotent(values in dataset_strategy()) {
        let gate = QualityGate::default();
        let once = gate.clean(&parse(&values));
        let twice = gate.clean(once.records());
        prop_assert_eq!(twice.records(), once.records());
        prop_assert_eq!(twice.drops().total(), 0);
    }

    #[test]
    fn survivors_keep_input_order(values in dataset_strategy()) {
        let records = parse(&values);
        let clean = QualityGate::default().clean(&records);
        let mut remaining = records.iter();
        for survivor in clean.records() {
            prop_assert!(remaining.any(|r| r == survivor));
        }
    }
}
