use async_trait::async_trait;
use thiserror::Error;

/// Transport-level failure. Callers fold this into their own domain error
/// category, so the client stays agnostic of which upstream it talked to.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse response: {0}")]
    Parse(String),
}

/// Trait for HTTP client operations (for mocking)
#[async_trait]
pub trait HttpClientTrait: Send + Sync + std::fmt::Debug {
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, HttpError>;

    async fn put_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, HttpError>;
}

/// Real HTTP client using reqwest.
///
/// Connection failures and timeouts are retried once before surfacing; every
/// other failure surfaces immediately.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(timeout: std::time::Duration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HttpError::Request(format!("failed to build client: {e}")))?;

        Ok(Self { client })
    }

    async fn execute_json(
        &self,
        method: reqwest::Method,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, HttpError> {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let mut request = self.client.request(method.clone(), url);
            for (key, value) in headers {
                request = request.header(*key, *value);
            }

            let response = match request.json(body).send().await {
                Ok(response) => response,
                Err(e) if attempt == 1 && (e.is_connect() || e.is_timeout()) => {
                    tracing::debug!(url, error = %e, "retrying after transient failure");
                    continue;
                }
                Err(e) => return Err(HttpError::Request(e.to_string())),
            };

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                return Err(HttpError::Status { status, body });
            }

            return response
                .json()
                .await
                .map_err(|e| HttpError::Parse(e.to_string()));
        }
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, HttpError> {
        self.execute_json(reqwest::Method::POST, url, &headers, body)
            .await
    }

    async fn put_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, HttpError> {
        self.execute_json(reqwest::Method::PUT, url, &headers, body)
            .await
    }
}
