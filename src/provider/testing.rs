//! In-process providers for unit tests.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::session::{ModelSession, SnapshotStream};
use super::{ProviderError, ProviderRequest, ProviderResult, TextStream, TranslationProvider, Usage};
use std::sync::Arc;

type Handler = Box<dyn Fn(&ProviderRequest) -> Result<String, ProviderError> + Send + Sync>;

/// Answers with a closure and tracks how many calls overlap.
pub struct FnProvider {
    handler: Handler,
    delay: Box<dyn Fn(&ProviderRequest) -> Duration + Send + Sync>,
    chunks: Option<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl FnProvider {
    pub fn new(handler: impl Fn(&ProviderRequest) -> Result<String, ProviderError> + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            delay: Box::new(|_| Duration::ZERO),
            chunks: None,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            seen: Mutex::default(),
        }
    }

    /// Appends `-fr` to the source text.
    pub fn suffixing() -> Self {
        Self::new(|request| Ok(format!("{}-fr", request.text)))
    }

    #[must_use]
    pub fn with_delay(mut self, delay: impl Fn(&ProviderRequest) -> Duration + Send + Sync + 'static) -> Self {
        self.delay = Box::new(delay);
        self
    }

    /// Makes `stream_translate` yield these chunks.
    #[must_use]
    pub fn with_stream(mut self, chunks: &[&str]) -> Self {
        self.chunks = Some(chunks.iter().map(|c| (*c).to_string()).collect());
        self
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Source texts in the order calls started.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TranslationProvider for FnProvider {
    fn name(&self) -> &str {
        "test"
    }

    async fn translate(&self, request: &ProviderRequest) -> Result<ProviderResult, ProviderError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(request.text.clone());
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let delay = (self.delay)(request);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let outcome = (self.handler)(request);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        outcome.map(|text| ProviderResult {
            text,
            usage: Some(Usage {
                input_tokens: Some(3),
                output_tokens: Some(5),
            }),
            ..ProviderResult::default()
        })
    }

    fn stream_translate(&self, _request: &ProviderRequest) -> Option<TextStream> {
        let chunks = self.chunks.clone()?;
        Some(Box::pin(futures_util::stream::iter(chunks.into_iter().map(Ok))))
    }
}

/// A model session answering with a closure, for wiring tests through the factory.
pub struct FnSession {
    handler: Handler,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl FnSession {
    pub fn new(
        handler: impl Fn(&ProviderRequest) -> Result<String, ProviderError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::default(),
        })
    }

    /// Appends `-fr` to the source text.
    pub fn suffixing() -> Arc<Self> {
        Self::new(|request| Ok(format!("{}-fr", request.text)))
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn answer(&self, request: &ProviderRequest) -> Result<String, ProviderError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        (self.handler)(request)
    }
}

#[async_trait]
impl ModelSession for FnSession {
    async fn respond(&self, request: &ProviderRequest) -> anyhow::Result<String> {
        Ok(self.answer(request)?)
    }

    fn stream_snapshots(&self, request: &ProviderRequest) -> anyhow::Result<SnapshotStream> {
        let text = self.answer(request)?;
        let half = text.char_indices().nth(text.chars().count() / 2).map_or(0, |(i, _)| i);
        let snapshots = vec![Ok(text[..half].to_string()), Ok(text)];
        Ok(Box::pin(futures_util::stream::iter(snapshots)))
    }
}
