use chrono::{DateTime, NaiveDateTime};

use crate::constants::{CANONICAL_DATE_FORMAT, TRANSACTION_DATE};
use crate::domain::Cell;
use crate::error::TransformError;

use super::rows::Rows;

/// Renders epoch milliseconds as a UTC `YYYY-MM-DD HH:MM:SS` string.
pub fn format_epoch_millis(millis: i64) -> Option<String> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.format(CANONICAL_DATE_FORMAT).to_string())
}

fn floor_millis(millis: f64) -> Option<i64> {
    if !millis.is_finite() {
        return None;
    }
    let floored = millis.floor();
    if floored >= i64::MIN as f64 && floored < i64::MAX as f64 {
        Some(floored as i64)
    } else {
        None
    }
}

/// Interprets a `transaction_date` cell as epoch milliseconds. Text that is
/// already in canonical form is accepted unchanged, so canonical output can be
/// fed back through the transformer.
pub fn normalize_date(cell: &Cell, record: usize) -> Result<String, TransformError> {
    let rendered = match cell {
        Cell::Integer(ms) => format_epoch_millis(*ms),
        Cell::Float(ms) => floor_millis(*ms).and_then(format_epoch_millis),
        Cell::Text(s) => {
            let s = s.trim();
            if let Ok(ms) = s.parse::<i64>() {
                format_epoch_millis(ms)
            } else if let Ok(ms) = s.parse::<f64>() {
                floor_millis(ms).and_then(format_epoch_millis)
            } else {
                NaiveDateTime::parse_from_str(s, CANONICAL_DATE_FORMAT)
                    .ok()
                    .map(|dt| dt.format(CANONICAL_DATE_FORMAT).to_string())
            }
        }
        Cell::Null => None,
    };
    rendered.ok_or_else(|| TransformError::coercion(TRANSACTION_DATE, record, cell, "epoch milliseconds"))
}

/// Rewrites `transaction_date` of every record in canonical text form. The
/// first unreadable date fails the whole batch.
pub fn normalize_dates(rows: &mut Rows) -> Result<(), TransformError> {
    for (index, record) in rows.iter_mut() {
        let cell = record
            .get_mut(TRANSACTION_DATE)
            .ok_or_else(|| TransformError::schema(TRANSACTION_DATE))?;
        *cell = Cell::Text(normalize_date(cell, index)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_millis_render_in_utc() {
        assert_eq!(
            normalize_date(&Cell::Integer(1_700_000_000_000), 0).unwrap(),
            "2023-11-14 22:13:20"
        );
        assert_eq!(normalize_date(&Cell::Integer(0), 0).unwrap(), "1970-01-01 00:00:00");
    }

    #[test]
    fn fractional_and_textual_millis() {
        assert_eq!(
            normalize_date(&Cell::Float(1_700_000_000_999.7), 0).unwrap(),
            "2023-11-14 22:13:20"
        );
        assert_eq!(
            normalize_date(&Cell::from("1700000000000"), 0).unwrap(),
            "2023-11-14 22:13:20"
        );
        assert_eq!(normalize_date(&Cell::Integer(-1500), 0).unwrap(), "1969-12-31 23:59:58");
    }

    #[test]
    fn canonical_text_passes_through() {
        assert_eq!(
            normalize_date(&Cell::from("2023-01-05 08:30:00"), 0).unwrap(),
            "2023-01-05 08:30:00"
        );
    }

    #[test]
    fn unreadable_dates_fail() {
        for cell in [
            Cell::from("Unknown"),
            Cell::from("2023-01-05"),
            Cell::Float(f64::NAN),
            Cell::Integer(i64::MAX),
            Cell::Null,
        ] {
            let err = normalize_date(&cell, 4).unwrap_err();
            assert!(matches!(err, TransformError::TypeCoercion { record: 4, .. }), "{cell:?}");
        }
    }

    #[test]
    fn batch_fails_fast_on_first_bad_date() {
        let mut rows = Rows::new(vec![
            [(TRANSACTION_DATE, Cell::Integer(0))].into_iter().collect(),
            [(TRANSACTION_DATE, Cell::from("yesterday"))].into_iter().collect(),
        ]);
        let err = normalize_dates(&mut rows).unwrap_err();
        assert!(matches!(err, TransformError::TypeCoercion { record: 1, .. }));
    }
}
