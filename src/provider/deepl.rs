//! DeepL dedicated-translation backend. Promptless: only the raw text is sent.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http::{HttpClient, HttpRequest};
use super::{
    INVALID_JSON_MESSAGE, ProviderError, ProviderRequest, ProviderResult, TranslationProvider,
    error_for_status, require_text,
};

const FREE_API_URL: &str = "https://api-free.deepl.com";
const PRO_API_URL: &str = "https://api.deepl.com";

const SOURCE_LANGUAGES: &[&str] = &[
    "AR", "BG", "CS", "DA", "DE", "EL", "EN", "ES", "ET", "FI", "FR", "HU", "ID", "IT", "JA",
    "KO", "LT", "LV", "NB", "NL", "PL", "PT", "RO", "RU", "SK", "SL", "SV", "TR", "UK", "ZH",
];

const TARGET_ONLY_LANGUAGES: &[&str] = &["EN-GB", "EN-US", "PT-BR", "PT-PT", "ZH-HANS", "ZH-HANT"];

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: [&'a str; 1],
    target_lang: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_lang: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    text: String,
}

#[derive(Debug, Clone)]
pub struct DeepLProvider {
    server_url: String,
    api_key: String,
    http: HttpClient,
}

impl DeepLProvider {
    /// Free-tier keys (suffix `:fx`) use the free endpoint unless `base_url` overrides it.
    pub fn new(api_key: impl Into<String>, base_url: Option<String>, http: HttpClient) -> Self {
        let api_key = api_key.into();
        let server_url = base_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| {
                if api_key.ends_with(":fx") {
                    FREE_API_URL.to_string()
                } else {
                    PRO_API_URL.to_string()
                }
            });
        Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            api_key,
            http,
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }
}

#[async_trait]
impl TranslationProvider for DeepLProvider {
    fn name(&self) -> &str {
        "deepl"
    }

    async fn translate(&self, request: &ProviderRequest) -> Result<ProviderResult, ProviderError> {
        let target_lang = target_code(&request.to.provider_code)?;
        let source_lang = if request.from.is_auto {
            None
        } else {
            Some(source_code(&request.from.provider_code)?)
        };

        let body = TranslateRequest {
            text: [request.text.as_str()],
            target_lang,
            source_lang,
        };
        let json = serde_json::to_value(&body).unwrap_or_default();
        let http_request = HttpRequest::post_json(
            format!("{}/v2/translate", self.server_url),
            &json,
            request.timeout_seconds,
        )
        .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key));

        let http = self.http.configured_for(&request.network);
        let response = http.send(&http_request).await?;
        if !response.is_success() {
            return Err(error_for_status(response.status, &response.headers, &response.body));
        }

        let parsed: TranslateResponse = serde_json::from_slice(&response.body)
            .map_err(|_| ProviderError::InvalidResponse(INVALID_JSON_MESSAGE.to_string()))?;
        let text = parsed
            .translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .unwrap_or_default();

        Ok(ProviderResult {
            text: require_text(text)?,
            usage: None,
            status_code: Some(response.status),
            headers: response.headers,
        })
    }
}

fn canonical(code: &str) -> String {
    code.trim().replace('_', "-").to_uppercase()
}

/// Maps a source language to DeepL's code. Regional variants collapse to the base language.
pub fn source_code(code: &str) -> Result<String, ProviderError> {
    let canonical = canonical(code);
    let mapped = match canonical.as_str() {
        "ZH-CN" | "ZH-TW" | "ZH-HANS" | "ZH-HANT" => "ZH".to_string(),
        "EN-GB" | "EN-US" => "EN".to_string(),
        other => other.to_string(),
    };

    if SOURCE_LANGUAGES.contains(&mapped.as_str()) {
        Ok(mapped)
    } else {
        Err(ProviderError::Unsupported(format!(
            "Error: Source language '{code}' is not supported by provider 'deepl'."
        )))
    }
}

/// Maps a target language to DeepL's code.
pub fn target_code(code: &str) -> Result<String, ProviderError> {
    let canonical = canonical(code);
    let mapped = match canonical.as_str() {
        "ZH-CN" => "ZH-HANS".to_string(),
        "ZH-TW" => "ZH-HANT".to_string(),
        other => other.to_string(),
    };

    if SOURCE_LANGUAGES.contains(&mapped.as_str()) || TARGET_ONLY_LANGUAGES.contains(&mapped.as_str()) {
        Ok(mapped)
    } else {
        Err(ProviderError::Unsupported(format!(
            "Error: Target language '{code}' is not supported by provider 'deepl'."
        )))
    }
}
