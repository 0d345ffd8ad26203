use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use super::Sink;
use crate::domain::CanonicalBatch;
use crate::error::Result;

/// Writes the canonical batch as a JSON array of objects, the same shape the
/// extractor reads.
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Sink for JsonFileSink {
    fn name(&self) -> &'static str {
        "json"
    }

    async fn load(&self, batch: &CanonicalBatch) -> Result<usize> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, batch.to_json_pretty()?).await?;
        info!(path = %self.path.display(), records = batch.len(), "Wrote canonical batch");
        Ok(batch.len())
    }
}
