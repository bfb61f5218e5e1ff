//! Flattening of arbitrarily shaped JSON payloads into tables
//!
//! Normalization runs in two passes. The first collects candidate records
//! from the payload and flattens each into a dotted-path map. The second
//! derives the column set (union of keys in first-seen order) and
//! materializes one row per record. Column types are then coerced by
//! sampling and fully empty columns are dropped.
//!
//! Accepted shapes:
//! - a list of objects, strings holding JSON, scalars or nested lists
//!   (nested lists are spliced one level)
//! - a single object with at least one scalar field (one record)
//! - an object whose fields are all containers and which holds a list
//!   (the first list provides the records)
//! - a string holding any of the above

use super::{Cell, Column, TabularResult};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, warn};

static NULL: Value = Value::Null;

/// Configuration for normalization
#[derive(Debug, Clone)]
pub struct NormalizeConfig {
    /// Separator between path segments of nested keys
    pub separator: String,

    /// How many non-null values to inspect when choosing a column type
    pub sample_size: usize,

    /// Fraction of numeric samples needed to make a column numeric
    pub numeric_threshold: f64,

    /// Text values treated as missing in text columns (case-insensitive)
    pub null_placeholders: Vec<String>,

    /// Key used for records built from bare scalars
    pub scalar_key: String,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        NormalizeConfig {
            separator: String::from("."),
            sample_size: 10,
            numeric_threshold: 0.7,
            null_placeholders: vec![
                String::from("null"),
                String::from("nan"),
                String::from("none"),
            ],
            scalar_key: String::from("value"),
        }
    }
}

/// Bookkeeping from one normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeReport {
    /// Records that made it into the table
    pub records: usize,

    /// Records skipped because they held malformed JSON
    pub skipped: usize,
}

/// Turns JSON payloads into [`TabularResult`]s
#[derive(Debug, Clone, Default)]
pub struct TableNormalizer {
    config: NormalizeConfig,
}

impl TableNormalizer {
    pub fn new(config: NormalizeConfig) -> Self {
        TableNormalizer { config }
    }

    /// Normalize a payload, discarding the report
    pub fn to_table(&self, raw: &Value) -> TabularResult {
        self.normalize(raw).0
    }

    /// Normalize a payload of any shape. Never fails: malformed records are
    /// skipped and an empty payload yields an empty table.
    pub fn normalize(&self, raw: &Value) -> (TabularResult, NormalizeReport) {
        let mut report = NormalizeReport::default();
        let mut records = Vec::new();
        self.collect_records(raw, 0, &mut records, &mut report);
        report.records = records.len();

        let table = self.materialize(records);
        debug!(
            rows = table.len(),
            columns = table.width(),
            skipped = report.skipped,
            "normalized payload"
        );
        (table, report)
    }

    /// Normalize several payloads as one list (batch results)
    pub fn normalize_all(&self, payloads: &[Value]) -> (TabularResult, NormalizeReport) {
        self.normalize(&Value::Array(payloads.to_vec()))
    }

    /// First pass: gather flattened records
    fn collect_records(
        &self,
        value: &Value,
        depth: usize,
        records: &mut Vec<Map<String, Value>>,
        report: &mut NormalizeReport,
    ) {
        match value {
            Value::Null => {}
            Value::String(s) if s.trim().is_empty() => {}
            Value::String(s) => match serde_json::from_str::<Value>(s) {
                Ok(parsed) => self.collect_records(&parsed, depth, records, report),
                Err(e) => {
                    warn!(error = %e, "skipping record with malformed JSON");
                    report.skipped += 1;
                }
            },
            Value::Array(items) if depth <= 1 => {
                for item in items {
                    self.collect_records(item, depth + 1, records, report);
                }
            }
            Value::Object(obj) if depth == 0 && !has_scalar_field(obj) => {
                match obj.values().find(|v| v.is_array()) {
                    Some(list) => self.collect_records(list, depth, records, report),
                    None => records.push(self.flatten(obj)),
                }
            }
            Value::Object(obj) => records.push(self.flatten(obj)),
            other => records.push(self.scalar_record(other.clone())),
        }
    }

    fn scalar_record(&self, value: Value) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert(self.config.scalar_key.clone(), value);
        record
    }

    /// Flatten nested objects into dotted keys. Lists stay as cell values.
    fn flatten(&self, obj: &Map<String, Value>) -> Map<String, Value> {
        let mut out = Map::new();
        self.flatten_into("", obj, &mut out);
        out
    }

    fn flatten_into(&self, prefix: &str, obj: &Map<String, Value>, out: &mut Map<String, Value>) {
        for (key, value) in obj {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}{}{}", prefix, self.config.separator, key)
            };

            match value {
                Value::Object(inner) => self.flatten_into(&path, inner, out),
                other => {
                    out.insert(path, other.clone());
                }
            }
        }
    }

    /// Second pass: derive columns and materialize rows
    fn materialize(&self, records: Vec<Map<String, Value>>) -> TabularResult {
        let mut seen = HashSet::new();
        let mut keys: Vec<String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if seen.insert(key.as_str()) {
                    keys.push(key.clone());
                }
            }
        }

        let columns = keys
            .into_iter()
            .map(|key| {
                let raw: Vec<&Value> = records
                    .iter()
                    .map(|r| r.get(&key).unwrap_or(&NULL))
                    .collect();
                Column::new(key, self.coerce(&raw))
            })
            .collect();

        TabularResult::from_columns(columns).drop_empty_columns()
    }

    /// Choose numeric or text for a column by sampling its non-null values
    fn coerce(&self, raw: &[&Value]) -> Vec<Cell> {
        let present: Vec<&Value> = raw
            .iter()
            .copied()
            .filter(|v| !is_missing(v))
            .collect();

        if present.is_empty() {
            return vec![Cell::Null; raw.len()];
        }

        let sample = &present[..present.len().min(self.config.sample_size)];
        let numeric = sample.iter().filter(|v| parse_number(v).is_some()).count();

        // An id too wide for i64 would be rounded as a float; keep such columns as text
        let exact = !present.iter().any(|v| is_oversized_integer(v));

        if exact && numeric as f64 >= sample.len() as f64 * self.config.numeric_threshold {
            raw.iter()
                .map(|v| parse_number(v).unwrap_or(Cell::Null))
                .collect()
        } else {
            raw.iter().map(|v| self.to_text(v)).collect()
        }
    }

    fn to_text(&self, value: &Value) -> Cell {
        if is_missing(value) {
            return Cell::Text(String::new());
        }
        let text = value_text(value);
        let placeholder = self
            .config
            .null_placeholders
            .iter()
            .any(|p| p.eq_ignore_ascii_case(&text));
        if placeholder {
            Cell::Text(String::new())
        } else {
            Cell::Text(text)
        }
    }
}

fn has_scalar_field(obj: &Map<String, Value>) -> bool {
    obj.values().any(|v| !v.is_array() && !v.is_object())
}

/// Null and empty-string cells both count as missing
fn is_missing(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Integral values become exact integers, everything else a finite float
fn parse_number(value: &Value) -> Option<Cell> {
    if is_oversized_integer(value) {
        return None;
    }
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Cell::Integer(i)),
            None => n.as_f64().filter(|f| f.is_finite()).map(Cell::Number),
        },
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => Some(Cell::Integer(i)),
                Err(_) => s.parse::<f64>().ok().filter(|f| f.is_finite()).map(Cell::Number),
            }
        }
        _ => None,
    }
}

/// Whole numbers outside the i64 range
fn is_oversized_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_u64() && n.as_i64().is_none(),
        Value::String(s) => {
            let s = s.trim();
            let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
            !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) && s.parse::<i64>().is_err()
        }
        _ => false,
    }
}
