use std::collections::HashSet;

use crate::domain::{Cell, CellKey};

use super::rows::Rows;

/// Removes records identical across all `columns` to an earlier record. The
/// first occurrence wins and survivors keep their relative order. Returns the
/// number of records removed.
pub fn drop_duplicates(columns: &[String], rows: &mut Rows) -> usize {
    let keep: Vec<bool> = {
        let mut seen: HashSet<Vec<CellKey<'_>>> = HashSet::with_capacity(rows.len());
        rows.records()
            .iter()
            .map(|record| {
                let key: Vec<CellKey<'_>> = columns
                    .iter()
                    .map(|c| record.get(c).map(Cell::key).unwrap_or(CellKey::Null))
                    .collect();
                seen.insert(key)
            })
            .collect()
    };
    rows.retain_flagged(keep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawBatch;
    use serde_json::json;

    #[test]
    fn first_occurrence_wins_and_order_is_kept() {
        let (columns, records) = serde_json::from_value::<RawBatch>(json!([
            {"customer_id": "A", "transaction_amount": 1},
            {"customer_id": "B", "transaction_amount": 2},
            {"customer_id": "A", "transaction_amount": 1},
            {"customer_id": "C", "transaction_amount": 3},
            {"customer_id": "B", "transaction_amount": 2.0}
        ]))
        .unwrap()
        .into_parts();

        let mut rows = Rows::new(records);

        let removed = drop_duplicates(&columns, &mut rows);

        assert_eq!(removed, 2);
        assert_eq!(rows.origins(), &[0, 1, 3]);
        let ids: Vec<&Cell> = rows.records().iter().filter_map(|r| r.get("customer_id")).collect();
        assert_eq!(ids, vec![&Cell::from("A"), &Cell::from("B"), &Cell::from("C")]);
    }

    #[test]
    fn records_differing_in_one_column_are_kept() {
        let (columns, records) = serde_json::from_value::<RawBatch>(json!([
            {"customer_id": "A", "transaction_amount": 1},
            {"customer_id": "A", "transaction_amount": 2}
        ]))
        .unwrap()
        .into_parts();

        let mut rows = Rows::new(records);
        assert_eq!(drop_duplicates(&columns, &mut rows), 0);
        assert_eq!(rows.len(), 2);
    }
}
