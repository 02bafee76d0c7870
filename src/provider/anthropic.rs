//! Anthropic Messages API backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http::{HttpClient, HttpRequest};
use super::{
    INVALID_JSON_MESSAGE, ProviderError, ProviderRequest, ProviderResult, TranslationProvider,
    Usage, error_for_status, require_text, versioned_url,
};

const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: Option<String>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: Option<u64>,
    output_tokens: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    base_url: String,
    model: String,
    api_key: String,
    http: HttpClient,
}

impl AnthropicProvider {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        http: HttpClient,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
            http,
        }
    }

    fn build_request(&self, request: &ProviderRequest) -> HttpRequest {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system: request.system_message(),
            messages: [Message {
                role: "user",
                content: request.user_message(),
            }],
        };
        let json = serde_json::to_value(&body).unwrap_or_default();

        HttpRequest::post_json(
            versioned_url(&self.base_url, "messages"),
            &json,
            request.timeout_seconds,
        )
        .header("x-api-key", self.api_key.as_str())
        .header("anthropic-version", API_VERSION)
    }
}

#[async_trait]
impl TranslationProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn translate(&self, request: &ProviderRequest) -> Result<ProviderResult, ProviderError> {
        let http = self.http.configured_for(&request.network);
        let response = http.send(&self.build_request(request)).await?;
        if !response.is_success() {
            return Err(error_for_status(response.status, &response.headers, &response.body));
        }

        let parsed: MessagesResponse = serde_json::from_slice(&response.body)
            .map_err(|_| ProviderError::InvalidResponse(INVALID_JSON_MESSAGE.to_string()))?;

        let text: String = parsed
            .content
            .into_iter()
            .filter(|block| block.kind.as_deref().is_none_or(|k| k == "text"))
            .filter_map(|block| block.text)
            .collect();

        Ok(ProviderResult {
            text: require_text(text)?,
            usage: parsed.usage.map(|u| Usage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            }),
            status_code: Some(response.status),
            headers: response.headers,
        })
    }
}
