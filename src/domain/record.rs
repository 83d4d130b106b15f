use serde_json::{Map, Number, Value};
use std::fmt;

use crate::constants::{ID_FIELD, LATITUDE_FIELD};

/// Raw record as returned by the upstream API
pub type RawRecord = Value;

/// Identifier of a record. Text and numeric ids never compare equal to each other,
/// even when they print the same.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordId {
    Text(String),
    /// Canonical numeric text: `1`, `1.0` and `1e0` all become `1`
    Number(String),
    /// Booleans, arrays and objects, kept as their JSON text
    Other(String),
}

impl RecordId {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(RecordId::Text(s.clone())),
            Value::Number(n) => Some(RecordId::Number(canonical_number(n))),
            other => Some(RecordId::Other(other.to_string())),
        }
    }
}

/// Integral values print as integers, everything else in shortest `f64` form, so ids
/// that are numerically equal hash the same.
fn canonical_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            (f as i64).to_string()
        }
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Text(s) | RecordId::Number(s) | RecordId::Other(s) => f.write_str(s),
        }
    }
}

/// One dataset entity with the fields the quality rules look at pulled out into typed
/// optional values. Everything else rides along untouched in `attributes`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: Option<RecordId>,
    pub category: Option<String>,
    /// Numeric latitude; non-numeric input is already coerced to `None`
    pub latitude: Option<f64>,
    attributes: Map<String, Value>,
}

impl Record {
    /// Parse an untyped JSON value. Never fails: missing or malformed fields become absent.
    pub fn from_value(value: &RawRecord, category_field: &str) -> Self {
        let attributes = match value {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };

        let id = attributes.get(ID_FIELD).and_then(RecordId::from_value);
        let category = attributes.get(category_field).and_then(category_from_value);
        let latitude = attributes.get(LATITUDE_FIELD).and_then(coerce_latitude);

        Self {
            id,
            category,
            latitude,
            attributes,
        }
    }

    pub fn from_values(values: &[RawRecord], category_field: &str) -> Vec<Self> {
        values
            .iter()
            .map(|v| Self::from_value(v, category_field))
            .collect()
    }

    /// The original object, verbatim
    pub fn raw(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// The original object with `latitude` replaced by its coerced numeric value (or null)
    pub fn cleaned(&self) -> Map<String, Value> {
        let mut row = self.attributes.clone();
        let latitude = self
            .latitude
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null);
        row.insert(LATITUDE_FIELD.to_string(), latitude);
        row
    }
}

fn category_from_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Coerce a latitude value to a number. Numeric strings are parsed after trimming;
/// anything else, including NaN, is treated as absent.
pub fn coerce_latitude(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| !v.is_nan())
}
