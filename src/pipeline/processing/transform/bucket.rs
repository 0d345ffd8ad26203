use crate::constants::{TRANSACTION_AMOUNT, TRANSACTION_CATEGORY};
use crate::domain::{Cell, TransactionCategory};
use crate::error::TransformError;

use super::filter::coerce_amount;
use super::rows::Rows;

/// Assigns `transaction_category` from the record's amount.
pub fn assign_categories(rows: &mut Rows) -> Result<(), TransformError> {
    for (index, record) in rows.iter_mut() {
        let cell = record
            .get(TRANSACTION_AMOUNT)
            .ok_or_else(|| TransformError::schema(TRANSACTION_AMOUNT))?;
        let category = TransactionCategory::from_amount(coerce_amount(cell, index)?);
        record.set(TRANSACTION_CATEGORY, Cell::from(category.as_str()));
    }
    Ok(())
}
