//! Translation backends behind one async contract.
//!
//! Every backend implements [`TranslationProvider`]: a required one-shot
//! `translate` and an optional `stream_translate`. Callers never branch on
//! backend identity; the [`factory`] resolves a [`ProviderSelection`] once per
//! invocation and the rest of the pipeline only sees the trait object.
//!
//! All failures are expressed as [`ProviderError`], the only error vocabulary
//! the scheduler understands.

use async_trait::async_trait;
use futures_util::Stream;
use std::collections::BTreeMap;
use std::pin::Pin;
use thiserror::Error;

use crate::translation::NormalizedLanguage;

pub mod anthropic;
pub mod deepl;
pub mod factory;
pub mod http;
pub mod openai;
pub mod retry;
pub mod session;
pub mod sse;
pub mod stream;
#[cfg(test)]
pub(crate) mod testing;

pub use factory::{BackendId, ProviderFactory, ProviderSelection, SelectionRequest};
pub use http::{HttpClient, HttpRequest, HttpResponse, HttpSender, ReqwestSender};
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};

/// Response headers, keyed by lowercase header name.
pub type Headers = BTreeMap<String, String>;

/// A finite, non-restartable sequence of text deltas.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send>>;

pub const EMPTY_RESPONSE_MESSAGE: &str = "Provider returned an empty response.";
pub const INVALID_JSON_MESSAGE: &str = "Provider returned invalid JSON response.";
pub const CONTEXT_WINDOW_MESSAGE: &str = "Error: Input exceeds the model's context window. \
     Consider a model with a larger context window, or split the input into smaller files.";

/// Per-invocation network behaviour.
///
/// Values are clamped to their minimums on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    pub timeout_seconds: u64,
    pub retries: u32,
    pub retry_base_delay_seconds: u64,
}

impl NetworkConfig {
    pub const DEFAULT_TIMEOUT_SECONDS: i64 = 120;
    pub const DEFAULT_RETRIES: i64 = 3;
    pub const DEFAULT_RETRY_BASE_DELAY_SECONDS: i64 = 1;

    /// Builds a config from raw (possibly out of range) values.
    pub fn clamped(timeout_seconds: i64, retries: i64, retry_base_delay_seconds: i64) -> Self {
        Self {
            timeout_seconds: timeout_seconds.max(1) as u64,
            retries: retries.clamp(0, i64::from(u32::MAX)) as u32,
            retry_base_delay_seconds: retry_base_delay_seconds.max(1) as u64,
        }
    }

    /// Total attempts allowed for one logical call.
    pub const fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::clamped(
            Self::DEFAULT_TIMEOUT_SECONDS,
            Self::DEFAULT_RETRIES,
            Self::DEFAULT_RETRY_BASE_DELAY_SECONDS,
        )
    }
}

/// One translation call. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub from: NormalizedLanguage,
    pub to: NormalizedLanguage,
    pub system_prompt: Option<String>,
    pub user_prompt: Option<String>,
    pub text: String,
    pub timeout_seconds: u64,
    pub network: NetworkConfig,
}

impl ProviderRequest {
    /// The message sent as the user turn: the rendered prompt, or the raw text.
    pub fn user_message(&self) -> &str {
        self.user_prompt
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(&self.text)
    }

    /// The system prompt, if one was rendered and is not blank.
    pub fn system_message(&self) -> Option<&str> {
        self.system_prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
    }
}

/// Token accounting reported by a backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderResult {
    pub text: String,
    pub usage: Option<Usage>,
    pub status_code: Option<u16>,
    pub headers: Headers,
}

/// Every way a backend call can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The remote rejected the request.
    #[error("{}", http_message(.status, .body))]
    Http {
        status: u16,
        headers: Headers,
        body: String,
    },

    /// The call exceeded its per-call budget.
    #[error(
        "Error: Request timed out after {seconds}s. Use 'translate config set network.timeout_seconds <value>' to increase the limit."
    )]
    Timeout { seconds: u64 },

    /// Malformed or empty payload.
    #[error("{0}")]
    InvalidResponse(String),

    /// Connection-level failure below HTTP.
    #[error("{0}")]
    Transport(String),

    /// The backend cannot perform this operation at all.
    #[error("{0}")]
    Unsupported(String),

    /// Streamed text could not be written to stdout.
    #[error("Error: Failed to write to stdout: {0}")]
    Output(String),
}

fn http_message(status: &u16, body: &str) -> String {
    if body.is_empty() {
        format!("API error (HTTP {status}).")
    } else {
        format!("API error (HTTP {status}): {body}")
    }
}

impl ProviderError {
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the HTTP layer may try the call again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Transport(_) => true,
            Self::Http { status, .. } => RetryPolicy::is_retryable_status(*status),
            Self::InvalidResponse(_) | Self::Unsupported(_) | Self::Output(_) => false,
        }
    }

    /// Headers carried by an HTTP error, for `Retry-After`.
    pub fn headers(&self) -> Option<&Headers> {
        match self {
            Self::Http { headers, .. } => Some(headers),
            _ => None,
        }
    }
}

/// Uniform contract implemented by every backend.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Backend name used in messages.
    fn name(&self) -> &str;

    async fn translate(&self, request: &ProviderRequest) -> Result<ProviderResult, ProviderError>;

    /// Incremental output, if the backend supports it.
    fn stream_translate(&self, _request: &ProviderRequest) -> Option<TextStream> {
        None
    }
}

/// Rejects empty or whitespace-only output.
pub fn require_text(text: String) -> Result<String, ProviderError> {
    if text.trim().is_empty() {
        Err(ProviderError::InvalidResponse(EMPTY_RESPONSE_MESSAGE.to_string()))
    } else {
        Ok(text)
    }
}

/// Maps a non-2xx HTTP response to the matching [`ProviderError`].
///
/// A 400 that mentions the context window becomes an actionable
/// `InvalidResponse` instead of a generic HTTP error.
pub fn error_for_status(status: u16, headers: &Headers, body: &[u8]) -> ProviderError {
    let body = String::from_utf8_lossy(body).trim().to_string();
    if status == 400 && mentions_context_window(&body) {
        return ProviderError::InvalidResponse(CONTEXT_WINDOW_MESSAGE.to_string());
    }
    ProviderError::Http {
        status,
        headers: headers.clone(),
        body,
    }
}

fn mentions_context_window(body: &str) -> bool {
    let lowered = body.to_lowercase();
    lowered.contains("context")
        && (lowered.contains("length") || lowered.contains("token") || lowered.contains("window"))
}

/// Joins `suffix` onto a base URL, inserting `/v1` unless the path already ends with it.
pub fn versioned_url(base_url: &str, suffix: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = reqwest::Url::parse(base)
        .map(|url| url.path().trim_matches('/').to_string())
        .unwrap_or_default();

    if path == "v1" || path.ends_with("/v1") {
        format!("{base}/{suffix}")
    } else {
        format!("{base}/v1/{suffix}")
    }
}
