use std::time::Duration;

use async_trait::async_trait;
use models::{Page, ScanId, ScanRecord};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::backend::{ScanBackend, StartResponse, StatusResponse};
use crate::error::BackendError;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// [`ScanBackend`] over the REST API.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("siteward/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join `segments` onto the base URL, keeping any path prefix it has.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidEndpoint(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(BackendError::Unauthorized);
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(BackendError::Http { status: status.as_u16(), message: error_message(&body) });
        }

        serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))
    }
}

/// Pull a human-readable message out of an error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| "the server could not process the request".to_string())
}

#[async_trait]
impl ScanBackend for HttpBackend {
    async fn start_scan(&self, url: &Url, token: &str) -> Result<StartResponse, BackendError> {
        let endpoint = self.endpoint(&["api", "analysis", "start"])?;
        debug!(%endpoint, target_url = %url, "starting scan");
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(token)
            .json(&serde_json::json!({ "url": url.as_str() }))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn scan_status(&self, id: &ScanId, token: &str) -> Result<StatusResponse, BackendError> {
        let endpoint = self.endpoint(&["api", "analysis", "status", id.as_str()])?;
        debug!(%endpoint, "polling scan status");
        let response = self.client.get(endpoint).bearer_auth(token).send().await?;
        Self::decode(response).await
    }

    async fn list_scans(&self, page: u32, size: u32, token: &str) -> Result<Page<ScanRecord>, BackendError> {
        let endpoint = self.endpoint(&["api", "analysis"])?;
        debug!(%endpoint, page, size, "listing scans");
        let response = self
            .client
            .get(endpoint)
            .bearer_auth(token)
            .query(&[("page", page), ("size", size)])
            .send()
            .await?;
        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::new(Url::parse(base).unwrap(), DEFAULT_TIMEOUT).unwrap()
    }

    #[test]
    fn test_endpoint_keeps_prefix() {
        let b = backend("https://api.example.com/v2/");
        let url = b.endpoint(&["api", "analysis", "status", "17"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v2/api/analysis/status/17");

        let b = backend("http://localhost:8080");
        let url = b.endpoint(&["api", "analysis"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/analysis");
    }

    #[test]
    fn test_endpoint_escapes_ids() {
        let b = backend("http://localhost:8080");
        let url = b.endpoint(&["api", "analysis", "status", "a/b"]).unwrap();
        assert_eq!(url.path(), "/api/analysis/status/a%2Fb");
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"message":"quota exceeded"}"#), "quota exceeded");
        assert_eq!(error_message(r#"{"error":"bad gateway"}"#), "bad gateway");
        assert_eq!(error_message("<html>oops</html>"), "the server could not process the request");
    }
}
