//! Chat-completions backend shared by OpenAI, Gemini, Ollama and any
//! OpenAI-compatible endpoint.

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};

use super::http::{HttpClient, HttpRequest};
use super::sse::{Content, sse_to_text_stream};
use super::stream::require_content;
use super::{
    INVALID_JSON_MESSAGE, ProviderError, ProviderRequest, ProviderResult, TextStream,
    TranslationProvider, Usage, error_for_status, require_text,
};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
}

/// Talks to a `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct ChatCompletionsProvider {
    name: String,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    http: HttpClient,
}

impl ChatCompletionsProvider {
    /// `endpoint` is the full chat-completions URL.
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        http: HttpClient,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            http,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_request(&self, request: &ProviderRequest, stream: bool) -> HttpRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system_message() {
            messages.push(Message {
                role: "system",
                content: system,
            });
        }
        messages.push(Message {
            role: "user",
            content: request.user_message(),
        });

        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            stream,
        };
        let json = serde_json::to_value(&body).unwrap_or_default();

        let http_request = HttpRequest::post_json(&self.endpoint, &json, request.timeout_seconds);
        match &self.api_key {
            Some(key) => http_request.header("Authorization", format!("Bearer {key}")),
            None => http_request,
        }
    }
}

#[async_trait]
impl TranslationProvider for ChatCompletionsProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn translate(&self, request: &ProviderRequest) -> Result<ProviderResult, ProviderError> {
        let http = self.http.configured_for(&request.network);
        let response = http.send(&self.build_request(request, false)).await?;
        if !response.is_success() {
            return Err(error_for_status(response.status, &response.headers, &response.body));
        }

        let parsed: ChatCompletionResponse = serde_json::from_slice(&response.body)
            .map_err(|_| ProviderError::InvalidResponse(INVALID_JSON_MESSAGE.to_string()))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .map(Content::into_text)
            .unwrap_or_default();

        Ok(ProviderResult {
            text: require_text(text)?,
            usage: parsed.usage.map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
            status_code: Some(response.status),
            headers: response.headers,
        })
    }

    fn stream_translate(&self, request: &ProviderRequest) -> Option<TextStream> {
        let http = self.http.configured_for(&request.network);
        let http_request = self.build_request(request, true);

        let deltas = async_stream::stream! {
            let response = match http.send_streaming(&http_request).await {
                Ok(response) => response,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            if !response.is_success() {
                let status = response.status;
                let headers = response.headers.clone();
                let body = response.collect_body().await.unwrap_or_default();
                yield Err(error_for_status(status, &headers, &body));
                return;
            }

            let mut text = std::pin::pin!(sse_to_text_stream(response.body));
            while let Some(item) = text.next().await {
                yield item;
            }
        };

        Some(require_content(deltas))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::provider::http::tests::{ScriptedSender, client_for, response};
    use crate::provider::{CONTEXT_WINDOW_MESSAGE, EMPTY_RESPONSE_MESSAGE, NetworkConfig};
    use crate::translation::NormalizedLanguage;

    fn request(system: Option<&str>, user: Option<&str>) -> ProviderRequest {
        ProviderRequest {
            from: NormalizedLanguage::from_code("en"),
            to: NormalizedLanguage::from_code("fr"),
            system_prompt: system.map(str::to_string),
            user_prompt: user.map(str::to_string),
            text: "Hello".to_string(),
            timeout_seconds: 9,
            network: NetworkConfig::clamped(9, 0, 1),
        }
    }

    fn provider(sender: std::sync::Arc<ScriptedSender>, key: Option<&str>) -> ChatCompletionsProvider {
        ChatCompletionsProvider::new(
            "openai",
            "https://api.openai.com/v1/chat/completions",
            "gpt-4o-mini",
            key.map(str::to_string),
            client_for(sender, 0),
        )
    }

    #[tokio::test]
    async fn test_translate_sends_messages_and_parses_usage() {
        let sender = ScriptedSender::new(vec![Ok(response(
            200,
            r#"{"choices":[{"message":{"content":"Bonjour"}}],"usage":{"prompt_tokens":12,"completion_tokens":3}}"#,
        ))]);
        let provider = provider(sender.clone(), Some("sk-test"));

        let result = provider
            .translate(&request(Some("You translate."), Some("Translate: Hello")))
            .await
            .unwrap();

        assert_eq!(result.text, "Bonjour");
        assert_eq!(
            result.usage,
            Some(Usage {
                input_tokens: Some(12),
                output_tokens: Some(3)
            })
        );

        let sent = &sender.requests()[0];
        assert_eq!(sent.url, "https://api.openai.com/v1/chat/completions");
        assert_eq!(sent.timeout_seconds, 9);
        assert!(sent.headers.contains(&("Authorization".into(), "Bearer sk-test".into())));
        let body: serde_json::Value = serde_json::from_slice(&sent.body).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Translate: Hello");
    }

    #[tokio::test]
    async fn test_translate_without_system_prompt_or_key() {
        let sender = ScriptedSender::new(vec![Ok(response(
            200,
            r#"{"choices":[{"message":{"content":[{"type":"text","text":"Hal"},{"type":"text","text":"lo"}]}}]}"#,
        ))]);
        let provider = provider(sender.clone(), None);

        let result = provider.translate(&request(None, None)).await.unwrap();

        assert_eq!(result.text, "Hallo");
        assert_eq!(result.usage, None);
        let sent = &sender.requests()[0];
        assert!(!sent.headers.iter().any(|(name, _)| name == "Authorization"));
        let body: serde_json::Value = serde_json::from_slice(&sent.body).unwrap();
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["content"], "Hello");
    }

    #[tokio::test]
    async fn test_translate_rejects_blank_content() {
        let sender = ScriptedSender::new(vec![Ok(response(
            200,
            r#"{"choices":[{"message":{"content":"   "}}]}"#,
        ))]);
        let err = provider(sender, None).translate(&request(None, None)).await.unwrap_err();
        assert_eq!(err, ProviderError::InvalidResponse(EMPTY_RESPONSE_MESSAGE.into()));
    }

    #[tokio::test]
    async fn test_translate_rejects_invalid_json() {
        let sender = ScriptedSender::new(vec![Ok(response(200, "<html>oops</html>"))]);
        let err = provider(sender, None).translate(&request(None, None)).await.unwrap_err();
        assert_eq!(err, ProviderError::InvalidResponse(INVALID_JSON_MESSAGE.into()));
    }

    #[tokio::test]
    async fn test_translate_maps_http_errors() {
        let sender = ScriptedSender::new(vec![Ok(response(401, "invalid api key"))]);
        let err = provider(sender, None).translate(&request(None, None)).await.unwrap_err();
        assert_eq!(err.status_code(), Some(401));

        let sender = ScriptedSender::new(vec![Ok(response(
            400,
            "maximum context length exceeded",
        ))]);
        let err = provider(sender, None).translate(&request(None, None)).await.unwrap_err();
        assert_eq!(err, ProviderError::InvalidResponse(CONTEXT_WINDOW_MESSAGE.into()));
    }

    #[tokio::test]
    async fn test_stream_translate_yields_sse_deltas() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Bon\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"jour\"}}]}\n\n",
            "data: [DONE]\n\n",
        );
        let sender = ScriptedSender::new(vec![Ok(response(200, body))]);
        let provider = provider(sender.clone(), None);

        let stream = provider.stream_translate(&request(None, None)).unwrap();
        let chunks: Vec<String> = stream.map(|c| c.unwrap()).collect().await;

        assert_eq!(chunks.concat(), "Bonjour");
        let body: serde_json::Value = serde_json::from_slice(&sender.requests()[0].body).unwrap();
        assert_eq!(body["stream"], true);
    }

    #[tokio::test]
    async fn test_stream_translate_surfaces_http_error() {
        let sender = ScriptedSender::new(vec![Ok(response(404, "no such model"))]);
        let stream = provider(sender, None).stream_translate(&request(None, None)).unwrap();

        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap_err().status_code(), Some(404));
    }

    #[tokio::test]
    async fn test_stream_translate_empty_stream_is_invalid() {
        let sender = ScriptedSender::new(vec![Ok(response(200, "data: [DONE]\n"))]);
        let stream = provider(sender, None).stream_translate(&request(None, None)).unwrap();

        let items: Vec<_> = stream.collect().await;
        assert_eq!(
            items,
            vec![Err(ProviderError::InvalidResponse(EMPTY_RESPONSE_MESSAGE.into()))]
        );
    }
}
