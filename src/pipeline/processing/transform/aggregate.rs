use std::collections::HashMap;

use crate::constants::{CUSTOMER_ID, TOTAL_PER_CUSTOMER, TRANSACTION_AMOUNT};
use crate::domain::{Cell, CellKey};
use crate::error::TransformError;

use super::filter::coerce_amount;
use super::rows::Rows;

/// Writes the sum of `transaction_amount` over each `customer_id` group into
/// every member of the group. Returns the number of groups.
pub fn broadcast_customer_totals(rows: &mut Rows) -> Result<usize, TransformError> {
    let (totals, groups) = {
        let mut sums: HashMap<CellKey<'_>, f64> = HashMap::new();
        let mut keys = Vec::with_capacity(rows.len());
        for (index, record) in rows.iter() {
            let customer = record
                .get(CUSTOMER_ID)
                .ok_or_else(|| TransformError::schema(CUSTOMER_ID))?
                .key();
            let amount = record
                .get(TRANSACTION_AMOUNT)
                .ok_or_else(|| TransformError::schema(TRANSACTION_AMOUNT))
                .and_then(|cell| coerce_amount(cell, index))?;
            *sums.entry(customer).or_insert(0.0) += amount;
            keys.push(customer);
        }
        let totals: Vec<f64> = keys.iter().map(|k| sums.get(k).copied().unwrap_or(0.0)).collect();
        (totals, sums.len())
    };

    for (record, total) in rows.records_mut().iter_mut().zip(totals) {
        record.set(TOTAL_PER_CUSTOMER, Cell::Float(total));
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Record;

    fn record(customer: Cell, amount: f64) -> Record {
        [(CUSTOMER_ID, customer), (TRANSACTION_AMOUNT, Cell::Float(amount))]
            .into_iter()
            .collect()
    }

    #[test]
    fn totals_are_broadcast_to_each_group_member() {
        let mut rows = Rows::new(vec![
            record(Cell::from("A"), 10.0),
            record(Cell::from("B"), 5.0),
            record(Cell::from("A"), 2.5),
        ]);

        let groups = broadcast_customer_totals(&mut rows).unwrap();

        assert_eq!(groups, 2);
        let totals: Vec<&Cell> = rows.records().iter().filter_map(|r| r.get(TOTAL_PER_CUSTOMER)).collect();
        assert_eq!(totals, vec![&Cell::Float(12.5), &Cell::Float(5.0), &Cell::Float(12.5)]);
    }

    #[test]
    fn numeric_customer_ids_group_by_value() {
        let mut rows = Rows::new(vec![record(Cell::Integer(7), 1.0), record(Cell::Float(7.0), 2.0)]);
        assert_eq!(broadcast_customer_totals(&mut rows).unwrap(), 1);
        assert_eq!(rows.records()[0].get(TOTAL_PER_CUSTOMER), Some(&Cell::Float(3.0)));
    }
}
