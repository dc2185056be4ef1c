//! Default collector transport built on reqwest.

use super::{BoxFuture, CollectorUrl, HttpClient, HttpRequestResult};
use crate::constants::{POST_CONTENT_TYPE, TRACKER_VERSION_LABEL};
use crate::{Error, Result};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder for creating a [`ReqwestHttpClient`].
#[derive(Debug, Clone)]
pub struct ReqwestHttpClientBuilder {
    timeout: Duration,
    user_agent: String,
}

impl ReqwestHttpClientBuilder {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("snowplow-tracker/{TRACKER_VERSION_LABEL}"),
        }
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> Result<ReqwestHttpClient> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(ReqwestHttpClient { client })
    }
}

impl Default for ReqwestHttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP client sending events with reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> ReqwestHttpClientBuilder {
        ReqwestHttpClientBuilder::new()
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        row_ids: Vec<i64>,
        oversize: bool,
    ) -> HttpRequestResult {
        match request.send().await {
            Ok(response) => {
                let status = response.status();
                tracing::debug!(status = status.as_u16(), events = row_ids.len(), "collector responded");
                HttpRequestResult::new(false, i32::from(status.as_u16()), row_ids, oversize)
            }
            Err(e) => {
                tracing::warn!(error = %e, events = row_ids.len(), "request to collector failed");
                HttpRequestResult::new(true, -1, row_ids, oversize)
            }
        }
    }
}

impl HttpClient for ReqwestHttpClient {
    fn http_get<'a>(
        &'a self,
        url: &'a CollectorUrl,
        query_string: String,
        row_ids: Vec<i64>,
        oversize: bool,
    ) -> BoxFuture<'a, HttpRequestResult> {
        Box::pin(async move {
            let mut target = url.as_url().clone();
            target.set_query(Some(&query_string));
            self.send(self.client.get(target), row_ids, oversize).await
        })
    }

    fn http_post<'a>(
        &'a self,
        url: &'a CollectorUrl,
        post_data: String,
        row_ids: Vec<i64>,
        oversize: bool,
    ) -> BoxFuture<'a, HttpRequestResult> {
        Box::pin(async move {
            let request = self
                .client
                .post(url.as_url().clone())
                .header(CONTENT_TYPE, POST_CONTENT_TYPE)
                .body(post_data);
            self.send(request, row_ids, oversize).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Method, Protocol};

    #[test]
    fn builds_with_custom_settings() {
        let client = ReqwestHttpClient::builder()
            .timeout(Duration::from_secs(2))
            .user_agent("test-agent")
            .build();
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn unreachable_collector_is_internal_error() {
        let client = ReqwestHttpClient::builder()
            .timeout(Duration::from_millis(500))
            .build()
            .unwrap();
        // Port 9 (discard) on localhost is closed in test environments.
        let url = CollectorUrl::new("127.0.0.1:9", Protocol::Http, Method::Post).unwrap();

        let result = client.http_post(&url, "{}".into(), vec![7], false).await;

        assert_eq!(result.status_code(), -1);
        assert!(!result.is_success());
        assert_eq!(result.row_ids(), &[7]);
        assert!(result.should_retry(&Default::default()));
    }
}
