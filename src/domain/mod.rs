//! Record and batch shapes shared by every pipeline stage.
//!
//! Batches travel between stages as JSON arrays of flat objects. A batch keeps
//! its column set explicitly so that a record missing a key is read as `null`
//! in that column, and so the canonical output keeps the input column order.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single loosely typed value as delivered by the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Integer(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Hashable view used for duplicate detection and grouping. Numbers compare
    /// by value, so `5` and `5.0` produce the same key.
    pub fn key(&self) -> CellKey<'_> {
        match self {
            Cell::Null => CellKey::Null,
            Cell::Integer(i) => CellKey::Integer(*i),
            Cell::Float(f) => {
                let f = *f;
                if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
                    CellKey::Integer(f as i64)
                } else {
                    CellKey::Float(f.to_bits())
                }
            }
            Cell::Text(s) => CellKey::Text(s),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => write!(f, "null"),
            Cell::Integer(i) => write!(f, "{}", i),
            Cell::Float(x) => write!(f, "{}", x),
            Cell::Text(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Integer(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKey<'a> {
    Null,
    Integer(i64),
    Float(u64),
    Text(&'a str),
}

/// An ordered mapping of column name to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, Cell>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.fields.get(column)
    }

    pub fn get_mut(&mut self, column: &str) -> Option<&mut Cell> {
        self.fields.get_mut(column)
    }

    /// Sets a value, keeping the column's position if it already exists.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Cell>) {
        self.fields.insert(column.into(), value.into());
    }

    pub fn remove(&mut self, column: &str) -> Option<Cell> {
        self.fields.shift_remove(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Cell)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Cell)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Builds the column set as the union of record keys in order of first
/// appearance and rewrites every record in that order, filling gaps with null.
fn homogenize(records: Vec<Record>) -> (Vec<String>, Vec<Record>) {
    let mut columns: IndexSet<String> = IndexSet::new();
    for record in &records {
        for column in record.columns() {
            if !columns.contains(column) {
                columns.insert(column.to_string());
            }
        }
    }
    let columns: Vec<String> = columns.into_iter().collect();

    let records = records
        .into_iter()
        .map(|mut record| {
            columns
                .iter()
                .map(|c| (c.clone(), record.remove(c).unwrap_or(Cell::Null)))
                .collect()
        })
        .collect();

    (columns, records)
}

/// A batch of records as delivered by the extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Record>", into = "Vec<Record>")]
pub struct RawBatch {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl RawBatch {
    pub fn new(records: Vec<Record>) -> Self {
        let (columns, records) = homogenize(records);
        Self { columns, records }
    }

    pub fn from_json_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Record>) {
        (self.columns, self.records)
    }
}

impl From<Vec<Record>> for RawBatch {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}

impl From<RawBatch> for Vec<Record> {
    fn from(batch: RawBatch) -> Self {
        batch.records
    }
}

/// The cleaned and enriched batch handed to the loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Record>", into = "Vec<Record>")]
pub struct CanonicalBatch {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl CanonicalBatch {
    pub(crate) fn from_parts(columns: Vec<String>, records: Vec<Record>) -> Self {
        Self { columns, records }
    }

    pub fn from_json_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.records)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<Record>> for CanonicalBatch {
    fn from(records: Vec<Record>) -> Self {
        let (columns, records) = homogenize(records);
        Self { columns, records }
    }
}

impl From<CanonicalBatch> for Vec<Record> {
    fn from(batch: CanonicalBatch) -> Self {
        batch.records
    }
}

/// Amount bucket assigned by the transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionCategory {
    Low,
    Medium,
    High,
}

impl TransactionCategory {
    /// Half-open bins: `[0, 50)` low, `[50, 200)` medium, `[200, inf)` high.
    pub fn from_amount(amount: f64) -> Self {
        use crate::constants::{HIGH_AMOUNT_THRESHOLD, MEDIUM_AMOUNT_THRESHOLD};
        if amount >= HIGH_AMOUNT_THRESHOLD {
            TransactionCategory::High
        } else if amount >= MEDIUM_AMOUNT_THRESHOLD {
            TransactionCategory::Medium
        } else {
            TransactionCategory::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionCategory::Low => "low",
            TransactionCategory::Medium => "medium",
            TransactionCategory::High => "high",
        }
    }
}

impl fmt::Display for TransactionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_primitive_json_values() {
        let batch: RawBatch = serde_json::from_value(json!([
            {"customer_id": "A", "transaction_amount": 12, "transaction_date": 1700000000000i64, "note": null},
            {"customer_id": "B", "transaction_amount": 12.5, "transaction_date": 1700000000000i64, "note": "x"}
        ]))
        .unwrap();

        let first = &batch.records()[0];
        assert_eq!(first.get("transaction_amount"), Some(&Cell::Integer(12)));
        assert_eq!(first.get("note"), Some(&Cell::Null));
        assert_eq!(batch.records()[1].get("transaction_amount"), Some(&Cell::Float(12.5)));
        assert_eq!(batch.records()[1].get("customer_id"), Some(&Cell::from("B")));
    }

    #[test]
    fn missing_keys_become_null_columns() {
        let batch: RawBatch = serde_json::from_value(json!([
            {"customer_id": "A"},
            {"transaction_amount": 3, "customer_id": "B"}
        ]))
        .unwrap();

        assert_eq!(batch.columns(), &["customer_id".to_string(), "transaction_amount".to_string()]);
        assert_eq!(batch.records()[0].get("transaction_amount"), Some(&Cell::Null));
        let order: Vec<&str> = batch.records()[1].columns().collect();
        assert_eq!(order, vec!["customer_id", "transaction_amount"]);
    }

    #[test]
    fn rejects_non_primitive_values() {
        let result: serde_json::Result<RawBatch> = serde_json::from_value(json!([{"customer_id": true}]));
        assert!(result.is_err());
        let result: serde_json::Result<RawBatch> = serde_json::from_value(json!([{"customer_id": {"id": 1}}]));
        assert!(result.is_err());
    }

    #[test]
    fn numeric_keys_compare_by_value() {
        assert_eq!(Cell::Integer(5).key(), Cell::Float(5.0).key());
        assert_eq!(Cell::Float(0.0).key(), Cell::Float(-0.0).key());
        assert_ne!(Cell::Float(5.5).key(), Cell::Integer(5).key());
        assert_ne!(Cell::from("5").key(), Cell::Integer(5).key());
    }

    #[test]
    fn category_bins_are_half_open() {
        assert_eq!(TransactionCategory::from_amount(0.0), TransactionCategory::Low);
        assert_eq!(TransactionCategory::from_amount(49.99), TransactionCategory::Low);
        assert_eq!(TransactionCategory::from_amount(50.0), TransactionCategory::Medium);
        assert_eq!(TransactionCategory::from_amount(199.99), TransactionCategory::Medium);
        assert_eq!(TransactionCategory::from_amount(200.0), TransactionCategory::High);
    }
}
