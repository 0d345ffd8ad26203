// Load targets for canonical batches

pub mod in_memory;
pub mod json_file;
pub mod sqlite;

pub use in_memory::InMemorySink;
pub use json_file::JsonFileSink;
pub use sqlite::SqliteSink;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{SinkConfig, SinkKind};
use crate::domain::CanonicalBatch;
use crate::error::Result;

/// Destination of a canonical batch. Returns the number of rows written.
#[async_trait]
pub trait Sink: Send + Sync {
    fn name(&self) -> &'static str;

    async fn load(&self, batch: &CanonicalBatch) -> Result<usize>;
}

/// Opens the sink selected by configuration.
pub fn open_sink(config: &SinkConfig) -> Result<Arc<dyn Sink>> {
    let sink: Arc<dyn Sink> = match config.kind {
        SinkKind::Sqlite => Arc::new(SqliteSink::open(&config.path, &config.table)?),
        SinkKind::Json => Arc::new(JsonFileSink::new(&config.path)),
    };
    Ok(sink)
}
