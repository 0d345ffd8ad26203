use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::domain::{CanonicalBatch, RawBatch};
use crate::error::{EtlError, Result, TransformError};
use crate::observability::metrics;
use crate::pipeline::ingestion::Extractor;
use crate::pipeline::processing::{RecordTransformer, TransformOutput, TransformReport, Transformer};
use crate::pipeline::storage::Sink;
use crate::pipeline::tasks::{run_task, RetryPolicy, TaskId};

/// Outcome of one successful pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub extracted: usize,
    pub loaded: usize,
    pub sink: &'static str,
    pub report: TransformReport,
}

/// Use case running extract, transform and load in order for one batch.
/// Nothing is loaded unless the transform succeeds for the whole batch.
pub struct EtlUseCase {
    extractor: Arc<dyn Extractor>,
    transformer: Arc<dyn Transformer>,
    sink: Arc<dyn Sink>,
    retry: RetryPolicy,
}

impl EtlUseCase {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        transformer: Arc<dyn Transformer>,
        sink: Arc<dyn Sink>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            extractor,
            transformer,
            sink,
            retry,
        }
    }

    /// Create a use case with the default record transformer
    pub fn with_default_transformer(
        extractor: Arc<dyn Extractor>,
        sink: Arc<dyn Sink>,
        retry: RetryPolicy,
    ) -> Self {
        Self::new(extractor, Arc::new(RecordTransformer::new()), sink, retry)
    }

    pub async fn extract(&self) -> Result<RawBatch> {
        run_task(TaskId::FetchData, &self.retry, || self.extractor.extract()).await
    }

    /// Transform errors describe the data, so the task is attempted once.
    pub fn transform(&self, raw: RawBatch) -> Result<TransformOutput> {
        let t0 = Instant::now();
        match self.transformer.transform(raw) {
            Ok(output) => {
                metrics::transform::batch_transformed(&output.report, t0.elapsed().as_secs_f64());
                info!(
                    task = %TaskId::TransformData,
                    input = output.report.input_records,
                    duplicates = output.report.duplicates_removed,
                    negatives = output.report.negative_amounts_dropped,
                    output = output.report.output_records,
                    customers = output.report.customer_groups,
                    "Task succeeded"
                );
                Ok(output)
            }
            Err(e) => {
                let kind = match e {
                    TransformError::Schema { .. } => "schema",
                    TransformError::TypeCoercion { .. } => "type_coercion",
                };
                metrics::transform::batch_failed(kind);
                error!(task = %TaskId::TransformData, kind, "Task failed: {}", e);
                Err(EtlError::from(e))
            }
        }
    }

    pub async fn load(&self, batch: &CanonicalBatch) -> Result<usize> {
        let t0 = Instant::now();
        let result = run_task(TaskId::LoadData, &self.retry, || self.sink.load(batch)).await;
        match &result {
            Ok(rows) => metrics::load::rows_loaded(self.sink.name(), *rows, t0.elapsed().as_secs_f64()),
            Err(_) => metrics::load::load_failed(self.sink.name()),
        }
        result
    }

    /// Runs the whole graph once. A failed task stops the run.
    pub async fn run(&self) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let span = info_span!("etl_run", %run_id);
        let result: Result<RunSummary> = async {
            info!("Starting pipeline run");
            let raw = self.extract().await?;
            let extracted = raw.len();
            let output = self.transform(raw)?;
            let loaded = self.load(&output.batch).await?;
            Ok::<_, EtlError>(RunSummary {
                run_id,
                extracted,
                loaded,
                sink: self.sink.name(),
                report: output.report,
            })
        }
        .instrument(span.clone())
        .await;

        span.in_scope(|| match &result {
            Ok(summary) => info!(loaded = summary.loaded, "Pipeline run finished"),
            Err(e) => error!("Pipeline run failed: {}", e),
        });
        metrics::run::finished(result.is_ok());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::storage::InMemorySink;
    use async_trait::async_trait;
    use serde_json::json;

    struct FixedExtractor(serde_json::Value);

    #[async_trait]
    impl Extractor for FixedExtractor {
        async fn extract(&self) -> Result<RawBatch> {
            Ok(serde_json::from_value(self.0.clone())?)
        }
    }

    #[tokio::test]
    async fn run_loads_transformed_batch() {
        let sink = InMemorySink::new();
        let extractor = FixedExtractor(json!([
            {"customer_id": "A", "transaction_amount": 250, "transaction_date": 1700000000000i64},
            {"customer_id": "A", "transaction_amount": 250, "transaction_date": 1700000000000i64},
            {"customer_id": "B", "transaction_amount": -1, "transaction_date": 1700000000000i64}
        ]));
        let use_case = EtlUseCase::with_default_transformer(
            Arc::new(extractor),
            Arc::new(sink.clone()),
            RetryPolicy::none(),
        );

        let summary = use_case.run().await.unwrap();

        assert_eq!(summary.extracted, 3);
        assert_eq!(summary.loaded, 1);
        assert_eq!(summary.sink, "memory");
        assert_eq!(summary.report.duplicates_removed, 1);
        assert_eq!(summary.report.negative_amounts_dropped, 1);
        assert_eq!(sink.batches().len(), 1);
    }

    #[tokio::test]
    async fn transform_failure_skips_load() {
        let sink = InMemorySink::new();
        let extractor = FixedExtractor(json!([{"customer_id": "A", "transaction_date": 0}]));
        let use_case = EtlUseCase::with_default_transformer(
            Arc::new(extractor),
            Arc::new(sink.clone()),
            RetryPolicy::none(),
        );

        let err = use_case.run().await.unwrap_err();

        assert!(matches!(err, EtlError::Transform(TransformError::Schema { .. })));
        assert!(sink.batches().is_empty());
    }
}
