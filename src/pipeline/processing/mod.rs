// Pipeline processing: cleaning and enrichment of extracted batches

pub mod transform;

pub use transform::{transform, RecordTransformer, TransformOutput, TransformReport, Transformer};
