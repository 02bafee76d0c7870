//! Opaque model-session backends (on-device models and system translation).
//!
//! A [`ModelSession`] is whatever runtime hosts the model. It answers a prompt
//! in one shot or as cumulative snapshots; [`SessionProvider`] adapts it to
//! the [`TranslationProvider`] contract and owns timeout and error mapping.

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use super::stream::snapshots_to_deltas;
use super::{ProviderError, ProviderRequest, ProviderResult, TextStream, TranslationProvider, require_text};

/// Cumulative snapshots: each item is the full text generated so far.
pub type SnapshotStream = Pin<Box<dyn Stream<Item = anyhow::Result<String>> + Send>>;

/// A prompt-answering runtime.
#[async_trait]
pub trait ModelSession: Send + Sync {
    async fn respond(&self, request: &ProviderRequest) -> anyhow::Result<String>;

    fn stream_snapshots(&self, request: &ProviderRequest) -> anyhow::Result<SnapshotStream>;
}

/// Stand-in for runtimes that are not compiled into this build.
#[derive(Debug, Clone)]
pub struct UnavailableSession {
    provider: String,
    reason: String,
}

impl UnavailableSession {
    pub fn new(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    fn message(&self) -> String {
        format!(
            "Error: Provider '{}' is unavailable in this build ({}).",
            self.provider, self.reason
        )
    }
}

#[async_trait]
impl ModelSession for UnavailableSession {
    async fn respond(&self, _request: &ProviderRequest) -> anyhow::Result<String> {
        Err(anyhow::Error::new(ProviderError::Unsupported(self.message())))
    }

    fn stream_snapshots(&self, _request: &ProviderRequest) -> anyhow::Result<SnapshotStream> {
        Err(anyhow::Error::new(ProviderError::Unsupported(self.message())))
    }
}

/// Adapts a [`ModelSession`] to [`TranslationProvider`].
#[derive(Clone)]
pub struct SessionProvider {
    name: String,
    session: Arc<dyn ModelSession>,
}

impl std::fmt::Debug for SessionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionProvider")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl SessionProvider {
    pub fn new(name: impl Into<String>, session: Arc<dyn ModelSession>) -> Self {
        Self {
            name: name.into(),
            session,
        }
    }
}

#[async_trait]
impl TranslationProvider for SessionProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn translate(&self, request: &ProviderRequest) -> Result<ProviderResult, ProviderError> {
        let seconds = request.timeout_seconds;
        let text = tokio::time::timeout(Duration::from_secs(seconds), self.session.respond(request))
            .await
            .map_err(|_| ProviderError::Timeout { seconds })?
            .map_err(|e| map_session_error(&self.name, seconds, e))?;

        Ok(ProviderResult {
            text: require_text(text)?,
            ..ProviderResult::default()
        })
    }

    fn stream_translate(&self, request: &ProviderRequest) -> Option<TextStream> {
        let name = self.name.clone();
        let seconds = request.timeout_seconds;

        let snapshots = match self.session.stream_snapshots(request) {
            Ok(snapshots) => snapshots,
            Err(e) => {
                let err = map_session_error(&name, seconds, e);
                return Some(Box::pin(futures_util::stream::once(async move { Err(err) })));
            }
        };

        let mapped = async_stream::stream! {
            let deadline = tokio::time::Instant::now() + Duration::from_secs(seconds);
            let mut snapshots = snapshots;
            loop {
                match tokio::time::timeout_at(deadline, snapshots.next()).await {
                    Err(_) => {
                        yield Err(ProviderError::Timeout { seconds });
                        return;
                    }
                    Ok(None) => return,
                    Ok(Some(Ok(snapshot))) => yield Ok(snapshot),
                    Ok(Some(Err(e))) => {
                        yield Err(map_session_error(&name, seconds, e));
                        return;
                    }
                }
            }
        };

        Some(snapshots_to_deltas(mapped))
    }
}

/// Keeps provider errors raised by the session as-is; classifies anything else.
fn map_session_error(provider: &str, seconds: u64, err: anyhow::Error) -> ProviderError {
    match err.downcast::<ProviderError>() {
        Ok(provider_error) => provider_error,
        Err(other) => {
            let message = other.to_string();
            if message.to_lowercase().contains("timed out") {
                ProviderError::Timeout { seconds }
            } else {
                ProviderError::Transport(format!("Error: {provider} request failed: {message}"))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::provider::{EMPTY_RESPONSE_MESSAGE, NetworkConfig};
    use crate::translation::NormalizedLanguage;

    struct ScriptedSession {
        reply: anyhow::Result<String>,
        snapshots: Vec<&'static str>,
        delay: Duration,
    }

    #[async_trait]
    impl ModelSession for ScriptedSession {
        async fn respond(&self, _request: &ProviderRequest) -> anyhow::Result<String> {
            tokio::time::sleep(self.delay).await;
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(anyhow::anyhow!("{e}")),
            }
        }

        fn stream_snapshots(&self, _request: &ProviderRequest) -> anyhow::Result<SnapshotStream> {
            let items: Vec<anyhow::Result<String>> =
                self.snapshots.iter().map(|s| Ok((*s).to_string())).collect();
            Ok(Box::pin(futures_util::stream::iter(items)))
        }
    }

    fn session(reply: anyhow::Result<String>) -> ScriptedSession {
        ScriptedSession {
            reply,
            snapshots: vec![],
            delay: Duration::ZERO,
        }
    }

    fn request(timeout_seconds: u64) -> ProviderRequest {
        ProviderRequest {
            from: NormalizedLanguage::from_code("en"),
            to: NormalizedLanguage::from_code("ja"),
            system_prompt: None,
            user_prompt: None,
            text: "Hello".to_string(),
            timeout_seconds,
            network: NetworkConfig::default(),
        }
    }

    #[tokio::test]
    async fn test_translate_returns_session_text() {
        let provider = SessionProvider::new("mlx", Arc::new(session(Ok("こんにちは".into()))));
        let result = provider.translate(&request(5)).await.unwrap();
        assert_eq!(result.text, "こんにちは");
        assert_eq!(result.usage, None);
    }

    #[tokio::test]
    async fn test_translate_rejects_blank_reply() {
        let provider = SessionProvider::new("mlx", Arc::new(session(Ok(" ".into()))));
        let err = provider.translate(&request(5)).await.unwrap_err();
        assert_eq!(err, ProviderError::InvalidResponse(EMPTY_RESPONSE_MESSAGE.into()));
    }

    #[tokio::test]
    async fn test_session_errors_are_classified() {
        let provider = SessionProvider::new("llama", Arc::new(session(Err(anyhow::anyhow!("model crashed")))));
        assert_eq!(
            provider.translate(&request(5)).await.unwrap_err(),
            ProviderError::Transport("Error: llama request failed: model crashed".into())
        );

        let provider = SessionProvider::new("llama", Arc::new(session(Err(anyhow::anyhow!("Request timed out")))));
        assert_eq!(
            provider.translate(&request(5)).await.unwrap_err(),
            ProviderError::Timeout { seconds: 5 }
        );
    }

    #[tokio::test]
    async fn test_slow_session_hits_timeout() {
        let slow = ScriptedSession {
            delay: Duration::from_secs(60),
            ..session(Ok("late".into()))
        };
        let provider = SessionProvider::new("coreml", Arc::new(slow));

        let err = provider.translate(&request(1)).await.unwrap_err();
        assert_eq!(err, ProviderError::Timeout { seconds: 1 });
    }

    #[tokio::test]
    async fn test_unavailable_session_is_unsupported() {
        let provider = SessionProvider::new(
            "apple-intelligence",
            Arc::new(UnavailableSession::new("apple-intelligence", "requires macOS")),
        );

        let err = provider.translate(&request(5)).await.unwrap_err();
        assert_eq!(
            err,
            ProviderError::Unsupported(
                "Error: Provider 'apple-intelligence' is unavailable in this build (requires macOS).".into()
            )
        );

        let items: Vec<_> = provider.stream_translate(&request(5)).unwrap().collect().await;
        assert!(matches!(items.as_slice(), [Err(ProviderError::Unsupported(_))]));
    }

    #[tokio::test]
    async fn test_stream_translate_converts_snapshots() {
        let scripted = ScriptedSession {
            snapshots: vec!["Hal", "Hallo", "Hallo", "Hallo Welt"],
            ..session(Ok(String::new()))
        };
        let provider = SessionProvider::new("mlx", Arc::new(scripted));

        let chunks: Vec<String> = provider
            .stream_translate(&request(5))
            .unwrap()
            .map(|c| c.unwrap())
            .collect()
            .await;
        assert_eq!(chunks, vec!["Hal", "lo", " Welt"]);
    }
}
