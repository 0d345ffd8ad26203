use async_trait::async_trait;

use crate::error::Result;

// Extract-side ports
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn post_json(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &serde_json::Value,
    ) -> Result<HttpPostResult>;
}

#[derive(Clone, Debug)]
pub struct HttpPostResult {
    pub status: u16,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl HttpPostResult {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// True for `application/json` and `+json` media types, ignoring parameters.
    pub fn is_json(&self) -> bool {
        let media_type = self
            .content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        media_type == "application/json" || media_type.ends_with("+json")
    }
}
