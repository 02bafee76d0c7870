//! Server-Sent Events (SSE) parser for chat-completions streaming responses.

use bytes::Bytes;
use futures_util::Stream;
use serde::Deserialize;

use super::ProviderError;

#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Option<Delta>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    content: Option<Content>,
}

/// Message content: a plain string or a list of `{text}` parts.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Content {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentPart {
    text: Option<String>,
}

impl Content {
    pub(crate) fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Parts(parts) => parts.into_iter().filter_map(|p| p.text).collect(),
        }
    }
}

/// Converts a raw SSE byte stream into a stream of text deltas.
///
/// Bytes are buffered until a full line arrives and only complete lines are
/// decoded. `data: [DONE]` ends the stream.
/// A transport error ends the stream after being yielded.
pub fn sse_to_text_stream(
    byte_stream: impl Stream<Item = Result<Bytes, ProviderError>> + Send + 'static,
) -> impl Stream<Item = Result<String, ProviderError>> + Send {
    async_stream::stream! {
        use futures_util::StreamExt;

        let mut byte_stream = std::pin::pin!(byte_stream);
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk_result) = byte_stream.next().await {
            let chunk = match chunk_result {
                Ok(c) => c,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            buffer.extend_from_slice(&chunk);

            while let Some(line_end) = buffer.iter().position(|&b| b == b'\n') {
                let raw: Vec<u8> = buffer.drain(..=line_end).collect();
                let line = String::from_utf8_lossy(&raw);
                let line = line.trim();

                if is_done(line) {
                    return;
                }
                if let Some(content) = parse_sse_line(line) {
                    yield Ok(content);
                }
            }
        }

        let rest = String::from_utf8_lossy(&buffer);
        let rest = rest.trim();
        if !is_done(rest) {
            if let Some(content) = parse_sse_line(rest) {
                yield Ok(content);
            }
        }
    }
}

fn is_done(line: &str) -> bool {
    line.strip_prefix("data:").map(str::trim) == Some("[DONE]")
}

/// Extracts the text carried by one `data:` line, if any.
fn parse_sse_line(line: &str) -> Option<String> {
    let json_str = line.strip_prefix("data:")?.trim_start();

    let response = serde_json::from_str::<StreamResponse>(json_str).ok()?;

    let content: String = response
        .choices
        .into_iter()
        .filter_map(|c| c.delta.and_then(|d| d.content))
        .map(Content::into_text)
        .collect();

    if content.is_empty() {
        None
    } else {
        Some(content)
    }
}
