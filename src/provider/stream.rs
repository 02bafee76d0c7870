//! Streaming aggregation: turns backend output into a flat sequence of deltas.
//!
//! Model-session backends report cumulative snapshots (the full text so far).
//! Those snapshots may reset mid-stream, so growth is never assumed.

use futures_util::{Stream, StreamExt};

use super::{EMPTY_RESPONSE_MESSAGE, ProviderError, TextStream};

/// The new text in `current` relative to `previous`.
///
/// Returns the suffix when `current` extends `previous`, nothing when they are
/// equal, and the whole of `current` when the backend diverged.
pub fn delta<'a>(previous: &str, current: &'a str) -> Option<&'a str> {
    if current == previous {
        return None;
    }
    let chunk = current.strip_prefix(previous).unwrap_or(current);
    (!chunk.is_empty()).then_some(chunk)
}

/// Converts a cumulative snapshot stream into a delta stream.
///
/// A stream that ends without emitting anything and whose last snapshot is
/// blank yields a single empty-response error.
pub fn snapshots_to_deltas<S>(snapshots: S) -> TextStream
where
    S: Stream<Item = Result<String, ProviderError>> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut snapshots = std::pin::pin!(snapshots);
        let mut previous = String::new();
        let mut emitted = false;

        while let Some(snapshot) = snapshots.next().await {
            let current = match snapshot {
                Ok(current) => current,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            if let Some(chunk) = delta(&previous, &current) {
                emitted = true;
                yield Ok(chunk.to_string());
            }
            previous = current;
        }

        if !emitted && previous.trim().is_empty() {
            yield Err(ProviderError::InvalidResponse(EMPTY_RESPONSE_MESSAGE.to_string()));
        }
    })
}

/// Passes deltas through, failing at the end if their concatenation is blank.
pub fn require_content<S>(deltas: S) -> TextStream
where
    S: Stream<Item = Result<String, ProviderError>> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut deltas = std::pin::pin!(deltas);
        let mut has_content = false;

        while let Some(item) = deltas.next().await {
            match item {
                Ok(chunk) => {
                    has_content |= !chunk.trim().is_empty();
                    yield Ok(chunk);
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        if !has_content {
            yield Err(ProviderError::InvalidResponse(EMPTY_RESPONSE_MESSAGE.to_string()));
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn snapshots(values: &[&str]) -> impl Stream<Item = Result<String, ProviderError>> + Send + 'static {
        let owned: Vec<Result<String, ProviderError>> =
            values.iter().map(|v| Ok((*v).to_string())).collect();
        futures_util::stream::iter(owned)
    }

    async fn collect(stream: TextStream) -> Vec<Result<String, ProviderError>> {
        stream.collect().await
    }

    #[test]
    fn test_delta_extension_yields_suffix() {
        assert_eq!(delta("Bon", "Bonjour"), Some("jour"));
        assert_eq!(delta("", "Hi"), Some("Hi"));
    }

    #[test]
    fn test_delta_equal_yields_nothing() {
        assert_eq!(delta("same", "same"), None);
        assert_eq!(delta("", ""), None);
    }

    #[test]
    fn test_delta_divergence_yields_whole_snapshot() {
        assert_eq!(delta("Hello", "Bonjour"), Some("Bonjour"));
        assert_eq!(delta("Hello", ""), None);
    }

    #[test]
    fn test_delta_handles_multibyte_prefixes() {
        assert_eq!(delta("こんに", "こんにちは"), Some("ちは"));
    }

    #[tokio::test]
    async fn test_monotonic_snapshots_reproduce_final_text() {
        let sequence = ["B", "Bo", "Bon", "Bon", "Bonjour", "Bonjour le monde"];
        let chunks: Vec<String> = collect(snapshots_to_deltas(snapshots(&sequence)))
            .await
            .into_iter()
            .map(|c| c.unwrap())
            .collect();

        assert_eq!(chunks.concat(), "Bonjour le monde");
        assert_eq!(chunks, vec!["B", "o", "n", "jour", " le monde"]);
    }

    #[tokio::test]
    async fn test_reset_snapshot_is_emitted_in_full() {
        let chunks: Vec<String> = collect(snapshots_to_deltas(snapshots(&["Hel", "Hello", "Bon", "Bonjour"])))
            .await
            .into_iter()
            .map(|c| c.unwrap())
            .collect();

        assert_eq!(chunks, vec!["Hel", "lo", "Bon", "jour"]);
    }

    #[tokio::test]
    async fn test_blank_snapshots_are_an_empty_response() {
        let items = collect(snapshots_to_deltas(snapshots(&["", ""]))).await;
        assert_eq!(
            items,
            vec![Err(ProviderError::InvalidResponse(EMPTY_RESPONSE_MESSAGE.to_string()))]
        );

        let items = collect(snapshots_to_deltas(snapshots(&[]))).await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_err());
    }

    #[tokio::test]
    async fn test_snapshot_error_is_forwarded() {
        let items: Vec<Result<String, ProviderError>> = vec![
            Ok("a".into()),
            Err(ProviderError::Timeout { seconds: 2 }),
            Ok("ab".into()),
        ];
        let results = collect(snapshots_to_deltas(futures_util::stream::iter(items))).await;

        assert_eq!(
            results,
            vec![Ok("a".to_string()), Err(ProviderError::Timeout { seconds: 2 })]
        );
    }

    #[tokio::test]
    async fn test_require_content_passes_chunks_through() {
        let results = collect(require_content(snapshots(&["Hola", " mundo"]))).await;
        assert_eq!(results, vec![Ok("Hola".to_string()), Ok(" mundo".to_string())]);
    }

    #[tokio::test]
    async fn test_require_content_rejects_whitespace_only_stream() {
        let results = collect(require_content(snapshots(&[" ", "\n"]))).await;
        assert_eq!(results.len(), 3);
        assert_eq!(
            results[2],
            Err(ProviderError::InvalidResponse(EMPTY_RESPONSE_MESSAGE.to_string()))
        );
    }
}
