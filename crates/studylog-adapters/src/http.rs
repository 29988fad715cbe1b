use std::time::Duration;

use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER};
use serde_json::Value as JsonValue;
use tracing::{debug, info_span, Instrument};

use crate::SourceError;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub referer: String,
    pub origin: String,
    pub accept_language: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            referer: "https://leetcode.cn/problemset/all/".to_string(),
            origin: "https://leetcode.cn".to_string(),
            accept_language: "zh-CN,zh;q=0.9,en;q=0.8".to_string(),
        }
    }
}

/// POSTs GraphQL documents to one endpoint with browser-like headers.
#[derive(Debug, Clone)]
pub struct GraphqlTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl GraphqlTransport {
    pub fn new(endpoint: impl Into<String>, config: &HttpClientConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language).context("accept-language header")?,
        );
        headers.insert(
            REFERER,
            HeaderValue::from_str(&config.referer).context("referer header")?,
        );
        headers.insert(
            ORIGIN,
            HeaderValue::from_str(&config.origin).context("origin header")?,
        );
        headers.insert(
            HeaderName::from_static("x-requested-with"),
            HeaderValue::from_static("XMLHttpRequest"),
        );

        let client = reqwest::Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .context("building reqwest client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends `{operationName, query, variables}` and returns the raw body of a
    /// 2xx response. Anything else is `UpstreamUnavailable`.
    pub async fn post(
        &self,
        operation: &'static str,
        query: &str,
        variables: JsonValue,
    ) -> Result<Vec<u8>, SourceError> {
        let payload = serde_json::json!({
            "operationName": operation,
            "query": query,
            "variables": variables,
        });
        let span = info_span!("graphql", operation, endpoint = %self.endpoint);

        async move {
            let unavailable = |reason: String| SourceError::UpstreamUnavailable { operation, reason };

            let resp = self
                .client
                .post(&self.endpoint)
                .json(&payload)
                .send()
                .await
                .map_err(|e| unavailable(e.to_string()))?;
            let status = resp.status();
            let body = resp
                .bytes()
                .await
                .map_err(|e| unavailable(e.to_string()))?
                .to_vec();
            debug!(status = status.as_u16(), bytes = body.len(), "graphql response");

            if !status.is_success() {
                return Err(unavailable(format!(
                    "http status {}: {}",
                    status.as_u16(),
                    snippet(&body)
                )));
            }
            Ok(body)
        }
        .instrument(span)
        .await
    }
}

/// First 512 bytes of a body, lossily decoded, for log lines and errors.
pub(crate) fn snippet(body: &[u8]) -> String {
    let end = body.len().min(512);
    String::from_utf8_lossy(&body[..end]).into_owned()
}
