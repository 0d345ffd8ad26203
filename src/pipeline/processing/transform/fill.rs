use crate::constants::TEXT_PLACEHOLDER;
use crate::domain::{Cell, Record};

/// Storage kind of a column, decided from its non-null values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Textual,
    Numeric,
}

/// A column holding any text is textual. Columns with only numbers, or with no
/// non-null sample at all, are numeric.
pub fn infer_kind(records: &[Record], column: &str) -> ColumnKind {
    let has_text = records
        .iter()
        .filter_map(|r| r.get(column))
        .any(|c| matches!(c, Cell::Text(_)));
    if has_text {
        ColumnKind::Textual
    } else {
        ColumnKind::Numeric
    }
}

fn placeholder_for(records: &[Record], column: &str, kind: ColumnKind) -> Cell {
    match kind {
        ColumnKind::Textual => Cell::from(TEXT_PLACEHOLDER),
        ColumnKind::Numeric => {
            let has_float = records
                .iter()
                .filter_map(|r| r.get(column))
                .any(|c| matches!(c, Cell::Float(_)));
            if has_float {
                Cell::Float(0.0)
            } else {
                Cell::Integer(0)
            }
        }
    }
}

/// Replaces every null (or missing) cell with the placeholder of its column's
/// kind. Kinds are computed before any cell of that column is touched.
/// Returns the number of cells filled.
pub fn fill_nulls(columns: &[String], records: &mut [Record]) -> usize {
    let mut filled = 0;
    for column in columns {
        let kind = infer_kind(records, column);
        let placeholder = placeholder_for(records, column, kind);
        for record in records.iter_mut() {
            match record.get_mut(column) {
                Some(cell) if cell.is_null() => {
                    *cell = placeholder.clone();
                    filled += 1;
                }
                Some(_) => {}
                None => {
                    record.set(column.clone(), placeholder.clone());
                    filled += 1;
                }
            }
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawBatch;
    use serde_json::json;

    fn batch(value: serde_json::Value) -> (Vec<String>, Vec<Record>) {
        serde_json::from_value::<RawBatch>(value).unwrap().into_parts()
    }

    #[test]
    fn fills_text_and_numeric_columns() {
        let (columns, mut records) = batch(json!([
            {"customer_id": "A", "transaction_amount": null, "spend_category": null},
            {"customer_id": null, "transaction_amount": 10, "spend_category": "food"}
        ]));

        let filled = fill_nulls(&columns, &mut records);

        assert_eq!(filled, 3);
        assert_eq!(records[1].get("customer_id"), Some(&Cell::from("Unknown")));
        assert_eq!(records[0].get("transaction_amount"), Some(&Cell::Integer(0)));
        assert_eq!(records[0].get("spend_category"), Some(&Cell::from("Unknown")));
    }

    #[test]
    fn float_columns_get_float_zero() {
        let (columns, mut records) = batch(json!([
            {"transaction_amount": 1.5},
            {"transaction_amount": null}
        ]));
        fill_nulls(&columns, &mut records);
        assert_eq!(records[1].get("transaction_amount"), Some(&Cell::Float(0.0)));
    }

    #[test]
    fn all_null_column_defaults_to_numeric() {
        let (columns, mut records) = batch(json!([{"note": null}, {"note": null}]));
        assert_eq!(infer_kind(&records, "note"), ColumnKind::Numeric);
        fill_nulls(&columns, &mut records);
        assert!(records.iter().all(|r| r.get("note") == Some(&Cell::Integer(0))));
    }

    #[test]
    fn mixed_column_is_textual() {
        let (_, records) = batch(json!([{"product_id": 7}, {"product_id": "P-8"}]));
        assert_eq!(infer_kind(&records, "product_id"), ColumnKind::Textual);
    }
}
