use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::app::ports::HttpClientPort;
use crate::config::ApiConfig;
use crate::constants::API_KEY_HEADER;
use crate::domain::RawBatch;
use crate::error::{EtlError, Result};
use crate::observability::metrics;

/// Source of raw batches for a pipeline run
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self) -> Result<RawBatch>;
}

/// Request body sent to the transactions API
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

pub fn payload_sha256(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

/// Fetches a batch with an authenticated POST of the date window.
pub struct ApiExtractor {
    http: Arc<dyn HttpClientPort>,
    url: String,
    api_key: Option<String>,
    request: ExtractRequest,
}

impl ApiExtractor {
    pub fn new(
        http: Arc<dyn HttpClientPort>,
        url: impl Into<String>,
        api_key: Option<String>,
        request: ExtractRequest,
    ) -> Self {
        Self {
            http,
            url: url.into(),
            api_key,
            request,
        }
    }

    pub fn from_config(http: Arc<dyn HttpClientPort>, api: &ApiConfig) -> Result<Self> {
        Ok(Self::new(
            http,
            api.endpoint()?,
            api.api_key.clone(),
            ExtractRequest {
                start_date: api.start_date,
                end_date: api.end_date,
            },
        ))
    }

    fn headers(&self) -> Vec<(String, String)> {
        self.api_key
            .iter()
            .map(|key| (API_KEY_HEADER.to_string(), key.clone()))
            .collect()
    }
}

#[async_trait]
impl Extractor for ApiExtractor {
    async fn extract(&self) -> Result<RawBatch> {
        let body = serde_json::to_value(&self.request)?;
        let t0 = Instant::now();
        let resp = self.http.post_json(&self.url, &self.headers(), &body).await?;

        if !resp.is_success() {
            metrics::extract::request_error(resp.status);
            let message: String = String::from_utf8_lossy(&resp.bytes).chars().take(512).collect();
            warn!(status = resp.status, "Extraction request rejected");
            return Err(EtlError::Api {
                status: resp.status,
                message,
            });
        }
        metrics::extract::request_success(t0.elapsed().as_secs_f64(), resp.bytes.len());

        if !resp.is_json() {
            warn!(content_type = %resp.content_type, "Response is not declared as JSON; decoding anyway");
        }
        let batch = RawBatch::from_json_slice(&resp.bytes).map_err(|e| {
            if resp.is_json() {
                EtlError::Json(e)
            } else {
                EtlError::Api {
                    status: resp.status,
                    message: format!("expected a JSON array, got '{}' content: {}", resp.content_type, e),
                }
            }
        })?;
        metrics::extract::records_extracted(batch.len());
        info!(
            records = batch.len(),
            columns = batch.columns().len(),
            bytes = resp.bytes.len(),
            sha256 = %payload_sha256(&resp.bytes),
            start_date = %self.request.start_date,
            end_date = %self.request.end_date,
            "Extracted raw batch"
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::HttpPostResult;
    use serde_json::json;
    use std::sync::Mutex;

    struct MockHttp {
        status: u16,
        body: Vec<u8>,
        content_type: String,
        seen: Mutex<Vec<(String, Vec<(String, String)>, serde_json::Value)>>,
    }

    impl MockHttp {
        fn new(status: u16, body: &str) -> Self {
            Self {
                status,
                body: body.as_bytes().to_vec(),
                content_type: "application/json".to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn with_content_type(mut self, content_type: &str) -> Self {
            self.content_type = content_type.to_string();
            self
        }
    }

    #[async_trait]
    impl HttpClientPort for MockHttp {
        async fn post_json(
            &self,
            url: &str,
            headers: &[(String, String)],
            body: &serde_json::Value,
        ) -> Result<HttpPostResult> {
            self.seen
                .lock()
                .unwrap()
                .push((url.to_string(), headers.to_vec(), body.clone()));
            Ok(HttpPostResult {
                status: self.status,
                bytes: self.body.clone(),
                content_type: self.content_type.clone(),
            })
        }
    }

    fn request() -> ExtractRequest {
        ExtractRequest {
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2023, 1, 31).unwrap(),
        }
    }

    #[tokio::test]
    async fn posts_date_window_with_api_key() {
        let http = Arc::new(MockHttp::new(
            200,
            r#"[{"customer_id": "A", "transaction_amount": 10, "transaction_date": 1700000000000}]"#,
        ));
        let extractor = ApiExtractor::new(http.clone(), "http://api.test/tx", Some("k3y".to_string()), request());

        let batch = extractor.extract().await.unwrap();

        assert_eq!(batch.len(), 1);
        let seen = http.seen.lock().unwrap();
        let (url, headers, body) = &seen[0];
        assert_eq!(url, "http://api.test/tx");
        assert_eq!(headers, &vec![("x-api-key".to_string(), "k3y".to_string())]);
        assert_eq!(body, &json!({"start_date": "2023-01-01", "end_date": "2023-01-31"}));
    }

    #[tokio::test]
    async fn non_success_status_is_an_api_error() {
        let http = Arc::new(MockHttp::new(503, "try later"));
        let extractor = ApiExtractor::new(http, "http://api.test/tx", None, request());

        let err = extractor.extract().await.unwrap_err();
        assert!(matches!(err, EtlError::Api { status: 503, ref message } if message == "try later"));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn non_array_payload_is_a_decode_error() {
        let http = Arc::new(MockHttp::new(200, r#"{"records": []}"#));
        let extractor = ApiExtractor::new(http, "http://api.test/tx", None, request());

        let err = extractor.extract().await.unwrap_err();
        assert!(matches!(err, EtlError::Json(_)));
    }

    #[tokio::test]
    async fn undeclared_json_body_still_decodes() {
        let http = Arc::new(MockHttp::new(200, r#"[{"customer_id": "A"}]"#).with_content_type("text/plain"));
        let extractor = ApiExtractor::new(http, "http://api.test/tx", None, request());

        assert_eq!(extractor.extract().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn non_json_content_is_reported_with_its_type() {
        let http = Arc::new(MockHttp::new(200, "<html>login</html>").with_content_type("text/html"));
        let extractor = ApiExtractor::new(http, "http://api.test/tx", None, request());

        let err = extractor.extract().await.unwrap_err();
        assert!(matches!(err, EtlError::Api { status: 200, ref message } if message.contains("text/html")));
        assert!(!err.is_retryable());
    }

    #[test]
    fn from_config_requires_url() {
        let http: Arc<dyn HttpClientPort> = Arc::new(MockHttp::new(200, "[]"));
        assert!(ApiExtractor::from_config(http, &ApiConfig::default()).is_err());
    }

    #[test]
    fn checksum_is_hex_sha256() {
        assert_eq!(
            payload_sha256(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
