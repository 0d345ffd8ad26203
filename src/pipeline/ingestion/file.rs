use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use super::extractor::{payload_sha256, Extractor};
use crate::domain::RawBatch;
use crate::error::Result;

/// Reads a raw batch previously written by the `extract` command.
pub struct FileExtractor {
    path: PathBuf,
}

impl FileExtractor {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl Extractor for FileExtractor {
    async fn extract(&self) -> Result<RawBatch> {
        let bytes = tokio::fs::read(&self.path).await?;
        let batch = RawBatch::from_json_slice(&bytes)?;
        info!(
            path = %self.path.display(),
            records = batch.len(),
            sha256 = %payload_sha256(&bytes),
            "Read raw batch"
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EtlError;

    #[tokio::test]
    async fn reads_json_array_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.json");
        std::fs::write(&path, r#"[{"customer_id": "A"}, {"customer_id": "B"}]"#).unwrap();

        let batch = FileExtractor::new(&path).extract().await.unwrap();
        assert_eq!(batch.len(), 2);
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let err = FileExtractor::new("/nonexistent/raw.json").extract().await.unwrap_err();
        assert!(matches!(err, EtlError::Io(_)));
    }
}
