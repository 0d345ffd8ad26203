use crate::constants::TRANSACTION_AMOUNT;
use crate::domain::Cell;
use crate::error::TransformError;

use super::rows::Rows;

/// Reads a transaction amount as a finite number. Text is accepted when it
/// holds a decimal number.
pub fn coerce_amount(cell: &Cell, record: usize) -> Result<f64, TransformError> {
    let amount = match cell {
        Cell::Integer(i) => Some(*i as f64),
        Cell::Float(f) => Some(*f),
        Cell::Text(s) => s.trim().parse::<f64>().ok(),
        Cell::Null => None,
    };
    amount
        .filter(|a| a.is_finite())
        .ok_or_else(|| TransformError::coercion(TRANSACTION_AMOUNT, record, cell, "a number"))
}

/// Drops records with a negative `transaction_amount`. Every amount is coerced
/// first; textual amounts are rewritten as numbers so later stages read them
/// directly. Returns the number of records dropped.
pub fn drop_negative_amounts(rows: &mut Rows) -> Result<usize, TransformError> {
    let mut keep = Vec::with_capacity(rows.len());
    for (index, record) in rows.iter_mut() {
        let cell = record
            .get_mut(TRANSACTION_AMOUNT)
            .ok_or_else(|| TransformError::schema(TRANSACTION_AMOUNT))?;
        let amount = coerce_amount(cell, index)?;
        if matches!(cell, Cell::Text(_)) {
            *cell = Cell::Float(amount);
        }
        keep.push(amount >= 0.0);
    }
    Ok(rows.retain_flagged(keep))
}
