// Extraction of raw transaction batches

pub mod extractor;
pub mod file;

pub use extractor::{payload_sha256, ApiExtractor, ExtractRequest, Extractor};
pub use file::FileExtractor;
