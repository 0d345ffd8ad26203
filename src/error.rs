use thiserror::Error;

/// Failures raised by the record transformer. Either one aborts the whole batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("Schema error: required column '{column}' is missing")]
    Schema { column: String },

    #[error("Type coercion error: column '{column}' at record {record}: cannot read {value} as {expected}")]
    TypeCoercion {
        column: String,
        record: usize,
        value: String,
        expected: &'static str,
    },
}

impl TransformError {
    pub fn schema(column: &str) -> Self {
        TransformError::Schema {
            column: column.to_string(),
        }
    }

    pub fn coercion(column: &str, record: usize, value: impl ToString, expected: &'static str) -> Self {
        TransformError::TypeCoercion {
            column: column.to_string(),
            record,
            value: value.to_string(),
            expected,
        }
    }
}

#[derive(Error, Debug)]
pub enum EtlError {
    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EtlError {
    /// Whether re-running the failed task could succeed. Structural and data
    /// errors fail the same way on every attempt, and so do API rejections
    /// other than server errors and rate limiting.
    pub fn is_retryable(&self) -> bool {
        match self {
            EtlError::Api { status, .. } => *status >= 500 || *status == 429,
            EtlError::Http(_)
            | EtlError::Io(_)
            | EtlError::Database(_)
            | EtlError::Storage(_) => true,
            EtlError::Transform(_) | EtlError::Json(_) | EtlError::Toml(_) | EtlError::Config(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_errors_are_not_retried() {
        let err: EtlError = TransformError::schema("transaction_amount").into();
        assert!(!err.is_retryable());

        let err: EtlError = TransformError::coercion("transaction_date", 3, "\"soon\"", "epoch milliseconds").into();
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("record 3"));
    }

    #[test]
    fn transient_errors_are_retried() {
        let err = EtlError::Api {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert!(err.is_retryable());
        assert!(EtlError::Io(std::io::Error::other("disk")).is_retryable());
        assert!(!EtlError::Config("bad".to_string()).is_retryable());
    }

    #[test]
    fn client_rejections_are_not_retried() {
        let api = |status| EtlError::Api {
            status,
            message: String::new(),
        };
        assert!(api(429).is_retryable());
        assert!(api(500).is_retryable());
        assert!(!api(400).is_retryable());
        assert!(!api(401).is_retryable());
        assert!(!api(404).is_retryable());
    }
}
