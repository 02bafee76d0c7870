//! One logical HTTP call: a single request abstraction with timeout and retry.
//!
//! The wire is behind [`HttpSender`] so the retry loop can be driven by a
//! scripted sender in tests. [`ReqwestSender`] is the real implementation.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use super::retry::RetryPolicy;
use super::{Headers, NetworkConfig, ProviderError};

/// Raw response body chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ProviderError>> + Send>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub timeout_seconds: u64,
}

impl HttpRequest {
    /// A JSON `POST` to `url`.
    pub fn post_json(url: impl Into<String>, body: &serde_json::Value, timeout_seconds: u64) -> Self {
        Self {
            url: url.into(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: body.to_string().into_bytes(),
            timeout_seconds,
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// A response whose body has not been read yet.
pub struct StreamingResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: ByteStream,
}

impl StreamingResponse {
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Reads the remaining body into memory.
    pub async fn collect_body(self) -> Result<Vec<u8>, ProviderError> {
        let mut body = Vec::new();
        let mut chunks = self.body;
        while let Some(chunk) = chunks.next().await {
            body.extend_from_slice(&chunk?);
        }
        Ok(body)
    }
}

/// Performs exactly one network attempt.
#[async_trait]
pub trait HttpSender: Send + Sync {
    async fn send_once(&self, request: &HttpRequest) -> Result<HttpResponse, ProviderError>;

    /// One attempt whose body is delivered incrementally.
    async fn send_streaming_once(
        &self,
        request: &HttpRequest,
    ) -> Result<StreamingResponse, ProviderError> {
        let response = self.send_once(request).await?;
        let body = Bytes::from(response.body);
        Ok(StreamingResponse {
            status: response.status,
            headers: response.headers,
            body: Box::pin(futures_util::stream::once(async move { Ok(body) })),
        })
    }
}

/// [`HttpSender`] backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestSender {
    client: reqwest::Client,
}

impl ReqwestSender {
    pub fn new() -> Self {
        Self::default()
    }

    async fn execute(&self, request: &HttpRequest) -> Result<reqwest::Response, ProviderError> {
        let mut builder = self
            .client
            .post(&request.url)
            .timeout(Duration::from_secs(request.timeout_seconds))
            .body(request.body.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder
            .send()
            .await
            .map_err(|e| map_reqwest_error(&e, request.timeout_seconds))
    }
}

#[async_trait]
impl HttpSender for ReqwestSender {
    async fn send_once(&self, request: &HttpRequest) -> Result<HttpResponse, ProviderError> {
        let response = self.execute(request).await?;
        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| map_reqwest_error(&e, request.timeout_seconds))?;

        Ok(HttpResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }

    async fn send_streaming_once(
        &self,
        request: &HttpRequest,
    ) -> Result<StreamingResponse, ProviderError> {
        let response = self.execute(request).await?;
        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let timeout_seconds = request.timeout_seconds;
        let body = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| map_reqwest_error(&e, timeout_seconds)));

        Ok(StreamingResponse {
            status,
            headers,
            body: Box::pin(body),
        })
    }
}

fn collect_headers(map: &reqwest::header::HeaderMap) -> Headers {
    map.iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_lowercase(), v.to_string()))
        })
        .collect()
}

fn map_reqwest_error(err: &reqwest::Error, timeout_seconds: u64) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout {
            seconds: timeout_seconds,
        }
    } else {
        ProviderError::Transport(err.to_string())
    }
}

/// Sends requests through an [`HttpSender`], retrying per a [`RetryPolicy`].
#[derive(Clone)]
pub struct HttpClient {
    sender: Arc<dyn HttpSender>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    pub fn new(sender: Arc<dyn HttpSender>, retry: RetryPolicy) -> Self {
        Self { sender, retry }
    }

    /// A reqwest-backed client with the default retry policy.
    pub fn reqwest(network: &NetworkConfig) -> Self {
        Self::new(Arc::new(ReqwestSender::new()), RetryPolicy::new(network))
    }

    /// The same wire and collaborators, retrying per `network`.
    #[must_use]
    pub fn configured_for(&self, network: &NetworkConfig) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
            retry: self.retry.for_network(network),
        }
    }

    /// Sends `request` until a non-retryable outcome or the attempt budget is spent.
    ///
    /// A non-2xx response is returned, not raised; callers map it with
    /// [`super::error_for_status`].
    pub async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ProviderError> {
        let mut attempt = 1;
        loop {
            match self.sender.send_once(request).await {
                Ok(response) if self.retry.should_retry(response.status, attempt) => {
                    tracing::debug!(status = response.status, attempt, url = %request.url, "retryable status");
                    self.retry.sleep_before_retry(attempt, &response.headers).await;
                }
                Ok(response) => return Ok(response),
                Err(err) if self.can_retry(&err, attempt) => {
                    tracing::debug!(error = %err, attempt, url = %request.url, "retryable failure");
                    self.retry
                        .sleep_before_retry(attempt, err.headers().unwrap_or(&Headers::new()))
                        .await;
                }
                Err(err) => return Err(err),
            }
            attempt += 1;
        }
    }

    /// Like [`Self::send`], but returns the body as a stream once a final status arrives.
    ///
    /// Retries only cover establishing the response; a failure mid-body is
    /// surfaced through the stream.
    pub async fn send_streaming(
        &self,
        request: &HttpRequest,
    ) -> Result<StreamingResponse, ProviderError> {
        let mut attempt = 1;
        loop {
            match self.sender.send_streaming_once(request).await {
                Ok(response) if self.retry.should_retry(response.status, attempt) => {
                    tracing::debug!(status = response.status, attempt, url = %request.url, "retryable status");
                    self.retry.sleep_before_retry(attempt, &response.headers).await;
                }
                Ok(response) => return Ok(response),
                Err(err) if self.can_retry(&err, attempt) => {
                    tracing::debug!(error = %err, attempt, url = %request.url, "retryable failure");
                    self.retry
                        .sleep_before_retry(attempt, err.headers().unwrap_or(&Headers::new()))
                        .await;
                }
                Err(err) => return Err(err),
            }
            attempt += 1;
        }
    }

    fn can_retry(&self, err: &ProviderError, attempt: u32) -> bool {
        attempt < self.retry.max_attempts() && err.is_retryable()
    }
}
