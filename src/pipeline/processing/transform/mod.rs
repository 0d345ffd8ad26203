//! Record transformer: turns a raw transaction batch into a canonical batch.
//!
//! The stages run in a fixed order and each relies on the previous ones:
//!
//! 1. null-fill by column kind
//! 2. duplicate removal
//! 3. negative amount filter
//! 4. date normalization (epoch milliseconds to `YYYY-MM-DD HH:MM:SS`),
//!    followed by a second duplicate pass over the coerced values, since
//!    sub-second dates and textual amounts only become comparable here
//! 5. amount bucketing into `transaction_category`
//! 6. per-customer totals broadcast into `total_per_customer`
//!
//! The whole batch is materialized before any output is produced; dedup and the
//! grouped totals need full-batch visibility.
//!
//! `TypeCoercion` errors report the record's position in the input batch.

pub mod aggregate;
pub mod bucket;
pub mod dates;
pub mod dedup;
pub mod fill;
pub mod filter;
pub mod rows;

use serde::Serialize;
use tracing::debug;

use crate::constants::{REQUIRED_COLUMNS, TOTAL_PER_CUSTOMER, TRANSACTION_CATEGORY};
use crate::domain::{CanonicalBatch, RawBatch};
use crate::error::TransformError;

use rows::Rows;

/// Counters describing what a transform run did to its batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransformReport {
    pub input_records: usize,
    pub nulls_filled: usize,
    pub duplicates_removed: usize,
    pub negative_amounts_dropped: usize,
    pub output_records: usize,
    pub customer_groups: usize,
}

#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub batch: CanonicalBatch,
    pub report: TransformReport,
}

/// Trait for turning raw batches into canonical batches
pub trait Transformer: Send + Sync {
    fn transform(&self, batch: RawBatch) -> Result<TransformOutput, TransformError>;
}

/// The fixed cleaning and enrichment rule pipeline. Holds no state, so one
/// instance can serve any number of runs or threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordTransformer;

impl RecordTransformer {
    pub fn new() -> Self {
        Self
    }

    fn check_schema(batch: &RawBatch) -> Result<(), TransformError> {
        if batch.is_empty() {
            return Ok(());
        }
        match REQUIRED_COLUMNS.iter().find(|c| !batch.has_column(c)) {
            Some(missing) => Err(TransformError::schema(missing)),
            None => Ok(()),
        }
    }
}

impl Transformer for RecordTransformer {
    fn transform(&self, batch: RawBatch) -> Result<TransformOutput, TransformError> {
        Self::check_schema(&batch)?;

        let mut report = TransformReport {
            input_records: batch.len(),
            ..Default::default()
        };
        let (mut columns, records) = batch.into_parts();
        let mut rows = Rows::new(records);

        report.nulls_filled = fill::fill_nulls(&columns, rows.records_mut());
        report.duplicates_removed = dedup::drop_duplicates(&columns, &mut rows);
        report.negative_amounts_dropped = filter::drop_negative_amounts(&mut rows)?;
        dates::normalize_dates(&mut rows)?;
        report.duplicates_removed += dedup::drop_duplicates(&columns, &mut rows);
        bucket::assign_categories(&mut rows)?;
        report.customer_groups = aggregate::broadcast_customer_totals(&mut rows)?;
        report.output_records = rows.len();

        for derived in [TRANSACTION_CATEGORY, TOTAL_PER_CUSTOMER] {
            if !columns.iter().any(|c| c == derived) {
                columns.push(derived.to_string());
            }
        }

        debug!(
            input = report.input_records,
            nulls_filled = report.nulls_filled,
            duplicates = report.duplicates_removed,
            negatives = report.negative_amounts_dropped,
            output = report.output_records,
            "Transformed batch"
        );

        Ok(TransformOutput {
            batch: CanonicalBatch::from_parts(columns, rows.into_records()),
            report,
        })
    }
}

/// Runs the default rule pipeline over a raw batch.
pub fn transform(batch: RawBatch) -> Result<CanonicalBatch, TransformError> {
    RecordTransformer.transform(batch).map(|output| output.batch)
}
