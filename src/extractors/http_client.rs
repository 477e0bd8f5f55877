use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::config::HttpConfig;
use crate::error::{ExtractError, ExtractResult};
use crate::extractors::PageFetcher;

/// Plain GET-as-text client. One attempt per request.
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &HttpConfig) -> ExtractResult<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            // Accept cookies so session-based pages work
            .cookie_store(true)
            .build()
            .map_err(|e| ExtractError::Fetch {
                url: String::new(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self { inner })
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn get_text(&self, url: &str) -> ExtractResult<String> {
        debug!("GET {}", url);

        let fail = |reason: String| ExtractError::Fetch {
            url: url.to_string(),
            reason,
        };

        let resp = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(fail(format!("HTTP {}", status)));
        }

        resp.text()
            .await
            .map_err(|e| fail(format!("failed to read response body: {}", e)))
    }
}
