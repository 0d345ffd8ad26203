//! Metrics for the ETL pipeline
//!
//! Recording goes through the `metrics` facade. Nothing is exported unless the
//! embedding process installs a recorder.

use std::fmt;

/// Enum representing all metric names used by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Extract metrics
    ExtractRequestsSuccess,
    ExtractRequestsError,
    ExtractRequestDuration,
    ExtractPayloadBytes,
    ExtractRecords,

    // Transform metrics
    TransformRecordsIn,
    TransformRecordsOut,
    TransformNullsFilled,
    TransformDuplicatesRemoved,
    TransformNegativeAmountsDropped,
    TransformErrors,
    TransformDuration,

    // Load metrics
    LoadRowsWritten,
    LoadErrors,
    LoadDuration,

    // Run metrics
    RunsSucceeded,
    RunsFailed,
    TaskRetries,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::ExtractRequestsSuccess => "etl_extract_requests_success_total",
            MetricName::ExtractRequestsError => "etl_extract_requests_error_total",
            MetricName::ExtractRequestDuration => "etl_extract_request_duration_seconds",
            MetricName::ExtractPayloadBytes => "etl_extract_payload_bytes",
            MetricName::ExtractRecords => "etl_extract_records_total",

            MetricName::TransformRecordsIn => "etl_transform_records_in_total",
            MetricName::TransformRecordsOut => "etl_transform_records_out_total",
            MetricName::TransformNullsFilled => "etl_transform_nulls_filled_total",
            MetricName::TransformDuplicatesRemoved => "etl_transform_duplicates_removed_total",
            MetricName::TransformNegativeAmountsDropped => "etl_transform_negative_amounts_dropped_total",
            MetricName::TransformErrors => "etl_transform_errors_total",
            MetricName::TransformDuration => "etl_transform_duration_seconds",

            MetricName::LoadRowsWritten => "etl_load_rows_written_total",
            MetricName::LoadErrors => "etl_load_errors_total",
            MetricName::LoadDuration => "etl_load_duration_seconds",

            MetricName::RunsSucceeded => "etl_runs_succeeded_total",
            MetricName::RunsFailed => "etl_runs_failed_total",
            MetricName::TaskRetries => "etl_task_retries_total",
        }
    }

    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            ExtractRequestsSuccess,
            ExtractRequestsError,
            ExtractRequestDuration,
            ExtractPayloadBytes,
            ExtractRecords,
            TransformRecordsIn,
            TransformRecordsOut,
            TransformNullsFilled,
            TransformDuplicatesRemoved,
            TransformNegativeAmountsDropped,
            TransformErrors,
            TransformDuration,
            LoadRowsWritten,
            LoadErrors,
            LoadDuration,
            RunsSucceeded,
            RunsFailed,
            TaskRetries,
        ]
        .into_iter()
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub mod extract {
    use super::MetricName;

    pub fn request_success(duration_secs: f64, payload_bytes: usize) {
        ::metrics::counter!(MetricName::ExtractRequestsSuccess.as_str()).increment(1);
        ::metrics::histogram!(MetricName::ExtractRequestDuration.as_str()).record(duration_secs);
        ::metrics::histogram!(MetricName::ExtractPayloadBytes.as_str()).record(payload_bytes as f64);
    }

    pub fn request_error(status: u16) {
        ::metrics::counter!(MetricName::ExtractRequestsError.as_str(), "status" => status.to_string())
            .increment(1);
    }

    pub fn records_extracted(count: usize) {
        ::metrics::counter!(MetricName::ExtractRecords.as_str()).increment(count as u64);
    }
}

pub mod transform {
    use super::MetricName;
    use crate::pipeline::processing::TransformReport;

    pub fn batch_transformed(report: &TransformReport, duration_secs: f64) {
        ::metrics::counter!(MetricName::TransformRecordsIn.as_str()).increment(report.input_records as u64);
        ::metrics::counter!(MetricName::TransformRecordsOut.as_str()).increment(report.output_records as u64);
        ::metrics::counter!(MetricName::TransformNullsFilled.as_str()).increment(report.nulls_filled as u64);
        ::metrics::counter!(MetricName::TransformDuplicatesRemoved.as_str())
            .increment(report.duplicates_removed as u64);
        ::metrics::counter!(MetricName::TransformNegativeAmountsDropped.as_str())
            .increment(report.negative_amounts_dropped as u64);
        ::metrics::histogram!(MetricName::TransformDuration.as_str()).record(duration_secs);
    }

    pub fn batch_failed(kind: &'static str) {
        ::metrics::counter!(MetricName::TransformErrors.as_str(), "kind" => kind).increment(1);
    }
}

pub mod load {
    use super::MetricName;

    pub fn rows_loaded(sink: &'static str, rows: usize, duration_secs: f64) {
        ::metrics::counter!(MetricName::LoadRowsWritten.as_str(), "sink" => sink).increment(rows as u64);
        ::metrics::histogram!(MetricName::LoadDuration.as_str(), "sink" => sink).record(duration_secs);
    }

    pub fn load_failed(sink: &'static str) {
        ::metrics::counter!(MetricName::LoadErrors.as_str(), "sink" => sink).increment(1);
    }
}

pub mod run {
    use super::MetricName;

    pub fn task_retried(task: &'static str) {
        ::metrics::counter!(MetricName::TaskRetries.as_str(), "task" => task).increment(1);
    }

    pub fn finished(success: bool) {
        let name = if success {
            MetricName::RunsSucceeded
        } else {
            MetricName::RunsFailed
        };
        ::metrics::counter!(name.as_str()).increment(1);
    }
}
