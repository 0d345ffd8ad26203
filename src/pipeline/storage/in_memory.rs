use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::Sink;
use crate::domain::CanonicalBatch;
use crate::error::{EtlError, Result};

/// In-memory sink for development/testing
#[derive(Clone, Default)]
pub struct InMemorySink {
    batches: Arc<Mutex<Vec<CanonicalBatch>>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> Vec<CanonicalBatch> {
        self.batches
            .lock()
            .map(|b| b.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Sink for InMemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self, batch: &CanonicalBatch) -> Result<usize> {
        let mut batches = self
            .batches
            .lock()
            .map_err(|_| EtlError::Storage("in-memory sink lock poisoned".to_string()))?;
        batches.push(batch.clone());
        debug!("Stored batch of {} records in memory", batch.len());
        Ok(batch.len())
    }
}
