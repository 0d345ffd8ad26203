pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod logging;
pub mod observability;
pub mod pipeline;

// Application use cases and their infrastructure adapters
pub mod app;
pub mod infra;

pub use domain::{CanonicalBatch, Cell, RawBatch, Record, TransactionCategory};
pub use error::{EtlError, Result, TransformError};
pub use pipeline::processing::transform;
