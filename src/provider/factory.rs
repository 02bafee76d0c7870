//! Resolves which backend to use, with which credentials and model.
//!
//! Selection happens once per invocation and yields an immutable
//! [`ProviderSelection`]; execution code never repeats the cascade.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::anthropic::AnthropicProvider;
use super::deepl::DeepLProvider;
use super::http::HttpClient;
use super::openai::ChatCompletionsProvider;
use super::session::{ModelSession, SessionProvider, UnavailableSession};
use super::{TranslationProvider, versioned_url};
use crate::config::{ProviderEntry, ResolvedConfig};
use crate::error::AppError;

/// Built-in backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BackendId {
    OpenAi,
    Anthropic,
    Gemini,
    Ollama,
    OpenAiCompatible,
    DeepL,
    CoreMl,
    Mlx,
    Llama,
    AppleIntelligence,
    AppleTranslate,
}

impl BackendId {
    pub const ALL: [Self; 11] = [
        Self::OpenAi,
        Self::Anthropic,
        Self::Gemini,
        Self::Ollama,
        Self::OpenAiCompatible,
        Self::DeepL,
        Self::CoreMl,
        Self::Mlx,
        Self::Llama,
        Self::AppleIntelligence,
        Self::AppleTranslate,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
            Self::OpenAiCompatible => "openai-compatible",
            Self::DeepL => "deepl",
            Self::CoreMl => "coreml",
            Self::Mlx => "mlx",
            Self::Llama => "llama",
            Self::AppleIntelligence => "apple-intelligence",
            Self::AppleTranslate => "apple-translate",
        }
    }

    /// Case-insensitive lookup.
    pub fn parse(name: &str) -> Option<Self> {
        let lowered = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|id| id.as_str() == lowered)
    }

    pub const fn default_model(self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("gpt-4o-mini"),
            Self::Anthropic => Some("claude-3-5-haiku-latest"),
            Self::Gemini => Some("gemini-2.0-flash"),
            Self::Ollama => Some("llama3.2"),
            _ => None,
        }
    }

    pub const fn default_base_url(self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("https://api.openai.com"),
            Self::Anthropic => Some("https://api.anthropic.com"),
            Self::Gemini => Some("https://generativelanguage.googleapis.com"),
            Self::Ollama => Some("http://localhost:11434"),
            _ => None,
        }
    }

    /// Environment variable holding the API key, for backends that need one.
    pub const fn api_key_env(self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Gemini => Some("GEMINI_API_KEY"),
            Self::DeepL => Some("DEEPL_API_KEY"),
            _ => None,
        }
    }

    /// Dedicated translation backends that ignore prompt templates.
    pub const fn is_promptless(self) -> bool {
        matches!(self, Self::DeepL | Self::AppleTranslate)
    }

    const fn rejects_base_url(self) -> bool {
        matches!(
            self,
            Self::OpenAi | Self::Anthropic | Self::Gemini | Self::Ollama | Self::DeepL
        )
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fully resolved backend for one invocation.
#[derive(Clone)]
pub struct ProviderSelection {
    pub name: String,
    /// `None` for named openai-compatible endpoints.
    pub backend: Option<BackendId>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub promptless: bool,
    pub provider: Arc<dyn TranslationProvider>,
}

impl fmt::Debug for ProviderSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSelection")
            .field("name", &self.name)
            .field("backend", &self.backend)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("promptless", &self.promptless)
            .finish_non_exhaustive()
    }
}

/// What the caller asked for. Overrides come from the CLI or the active preset.
#[derive(Debug, Clone, Default)]
pub struct SelectionRequest {
    pub provider: String,
    /// Whether `--provider` was passed explicitly.
    pub explicit_provider: bool,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// `false` under `--dry-run`: missing keys are tolerated.
    pub require_credentials: bool,
}

/// Builds [`ProviderSelection`]s from resolved configuration.
pub struct ProviderFactory {
    config: ResolvedConfig,
    env: BTreeMap<String, String>,
    http: HttpClient,
    sessions: BTreeMap<BackendId, Arc<dyn ModelSession>>,
}

impl ProviderFactory {
    pub fn new(config: ResolvedConfig, env: BTreeMap<String, String>, http: HttpClient) -> Self {
        Self {
            config,
            env,
            http,
            sessions: BTreeMap::new(),
        }
    }

    /// Installs a runtime for a model-session backend.
    #[must_use]
    pub fn with_session(mut self, backend: BackendId, session: Arc<dyn ModelSession>) -> Self {
        self.sessions.insert(backend, session);
        self
    }

    pub fn make(&self, request: &SelectionRequest) -> Result<ProviderSelection, AppError> {
        let selection = if let Some(backend) = BackendId::parse(&request.provider) {
            self.make_builtin(backend, request)?
        } else if let Some(entry) = self.config.named_endpoints.get(&request.provider) {
            self.make_named(&request.provider, entry, request)?
        } else {
            return Err(AppError::invalid_arguments(format!(
                "Unknown provider '{}'. Run translate --help for valid providers.",
                request.provider
            )));
        };

        tracing::debug!(?selection, "provider selected");
        Ok(selection)
    }

    fn make_builtin(
        &self,
        backend: BackendId,
        request: &SelectionRequest,
    ) -> Result<ProviderSelection, AppError> {
        if request.explicit_provider && request.base_url.is_some() && backend.rejects_base_url() {
            return Err(AppError::invalid_arguments(format!(
                "--base-url cannot be used with --provider {backend}. \
                 It is only valid for openai-compatible providers."
            )));
        }

        match backend {
            BackendId::OpenAi | BackendId::Gemini | BackendId::Ollama => {
                self.make_chat_completions(backend, request)
            }
            BackendId::OpenAiCompatible => {
                let entry = self.config.provider_entry(backend);
                self.make_compatible(backend.as_str(), Some(backend), &entry, request)
            }
            BackendId::Anthropic => {
                let entry = self.config.provider_entry(backend);
                let model = pick(&request.model, &entry.model, backend.default_model());
                let base_url = pick(&None, &entry.base_url, backend.default_base_url());
                let api_key = self.api_key(backend, &entry, request)?;
                let provider = AnthropicProvider::new(
                    base_url.clone().unwrap_or_default(),
                    model.clone().unwrap_or_default(),
                    api_key.clone().unwrap_or_default(),
                    self.http.clone(),
                );
                Ok(ProviderSelection {
                    name: backend.as_str().to_string(),
                    backend: Some(backend),
                    model,
                    base_url,
                    api_key,
                    promptless: false,
                    provider: Arc::new(provider),
                })
            }
            BackendId::DeepL => {
                let entry = self.config.provider_entry(backend);
                let api_key = self.api_key(backend, &entry, request)?;
                let provider = DeepLProvider::new(
                    api_key.clone().unwrap_or_default(),
                    entry.base_url.clone(),
                    self.http.clone(),
                );
                Ok(ProviderSelection {
                    name: backend.as_str().to_string(),
                    backend: Some(backend),
                    model: None,
                    base_url: Some(provider.server_url().to_string()),
                    api_key,
                    promptless: true,
                    provider: Arc::new(provider),
                })
            }
            BackendId::CoreMl
            | BackendId::Mlx
            | BackendId::Llama
            | BackendId::AppleIntelligence
            | BackendId::AppleTranslate => self.make_session(backend, request),
        }
    }

    fn make_chat_completions(
        &self,
        backend: BackendId,
        request: &SelectionRequest,
    ) -> Result<ProviderSelection, AppError> {
        let entry = self.config.provider_entry(backend);
        let model = pick(&request.model, &entry.model, backend.default_model());
        let base_url = pick(&None, &entry.base_url, backend.default_base_url());
        let api_key = self.api_key(backend, &entry, request)?;

        let base = base_url.clone().unwrap_or_default();
        let endpoint = if backend == BackendId::Gemini {
            format!("{}/v1beta/openai/chat/completions", base.trim_end_matches('/'))
        } else {
            versioned_url(&base, "chat/completions")
        };

        let provider = ChatCompletionsProvider::new(
            backend.as_str(),
            endpoint,
            model.clone().unwrap_or_default(),
            api_key.clone(),
            self.http.clone(),
        );
        Ok(ProviderSelection {
            name: backend.as_str().to_string(),
            backend: Some(backend),
            model,
            base_url,
            api_key,
            promptless: false,
            provider: Arc::new(provider),
        })
    }

    fn make_named(
        &self,
        name: &str,
        entry: &ProviderEntry,
        request: &SelectionRequest,
    ) -> Result<ProviderSelection, AppError> {
        self.make_compatible(name, None, entry, request)
    }

    fn make_compatible(
        &self,
        name: &str,
        backend: Option<BackendId>,
        entry: &ProviderEntry,
        request: &SelectionRequest,
    ) -> Result<ProviderSelection, AppError> {
        let base_url = pick(&request.base_url, &entry.base_url, None).ok_or_else(|| {
            AppError::invalid_arguments("--base-url is required when using openai-compatible.")
        })?;
        let model = pick(&request.model, &entry.model, None).ok_or_else(|| {
            AppError::invalid_arguments("--model is required when using openai-compatible.")
        })?;
        let api_key = pick(&request.api_key, &entry.api_key, None);

        let provider = ChatCompletionsProvider::new(
            name,
            versioned_url(&base_url, "chat/completions"),
            model.clone(),
            api_key.clone(),
            self.http.clone(),
        );
        Ok(ProviderSelection {
            name: name.to_string(),
            backend,
            model: Some(model),
            base_url: Some(base_url),
            api_key,
            promptless: false,
            provider: Arc::new(provider),
        })
    }

    fn make_session(
        &self,
        backend: BackendId,
        request: &SelectionRequest,
    ) -> Result<ProviderSelection, AppError> {
        let apple = matches!(backend, BackendId::AppleIntelligence | BackendId::AppleTranslate);
        if backend == BackendId::AppleTranslate && request.model.is_some() {
            return Err(AppError::invalid_arguments(
                "--model is not applicable for apple-translate. This provider does not use a model.",
            ));
        }
        if apple && request.api_key.is_some() {
            return Err(AppError::invalid_arguments(format!(
                "--api-key is not applicable for {backend}."
            )));
        }

        let session: Arc<dyn ModelSession> = match self.sessions.get(&backend) {
            Some(session) => Arc::clone(session),
            None => {
                let reason = if apple {
                    "requires the macOS system frameworks"
                } else {
                    "no on-device model runtime is linked"
                };
                Arc::new(UnavailableSession::new(backend.as_str(), reason))
            }
        };

        let model = if backend == BackendId::AppleTranslate {
            None
        } else {
            let entry = self.config.provider_entry(backend);
            pick(&request.model, &entry.model, None)
        };

        Ok(ProviderSelection {
            name: backend.as_str().to_string(),
            backend: Some(backend),
            model,
            base_url: None,
            api_key: None,
            promptless: backend.is_promptless(),
            provider: Arc::new(SessionProvider::new(backend.as_str(), session)),
        })
    }

    /// CLI, then config, then environment.
    fn api_key(
        &self,
        backend: BackendId,
        entry: &ProviderEntry,
        request: &SelectionRequest,
    ) -> Result<Option<String>, AppError> {
        let Some(env_name) = backend.api_key_env() else {
            return Ok(pick(&request.api_key, &entry.api_key, None));
        };

        let key = pick(&request.api_key, &entry.api_key, None)
            .or_else(|| self.env.get(env_name).filter(|v| !v.trim().is_empty()).cloned());

        if key.is_none() && request.require_credentials {
            return Err(AppError::runtime(format!(
                "Error: {env_name} is required for provider '{backend}'."
            )));
        }
        Ok(key)
    }
}

/// First non-blank value among override, config and default.
fn pick(over: &Option<String>, config: &Option<String>, default: Option<&str>) -> Option<String> {
    over.iter()
        .chain(config.iter())
        .find(|v| !v.trim().is_empty())
        .cloned()
        .or_else(|| default.map(str::to_string))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ConfigFile;
    use crate::error::ErrorKind;
    use crate::provider::NetworkConfig;
    use std::path::PathBuf;

    fn config(source: &str) -> ResolvedConfig {
        let table: toml::Table = source.parse().unwrap();
        let file = ConfigFile::from_table(&table).unwrap();
        ResolvedConfig::new(PathBuf::from("config.toml"), table, file)
    }

    fn factory(source: &str, env: &[(&str, &str)]) -> ProviderFactory {
        let env = env
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ProviderFactory::new(config(source), env, HttpClient::reqwest(&NetworkConfig::default()))
    }

    fn request(provider: &str) -> SelectionRequest {
        SelectionRequest {
            provider: provider.to_string(),
            explicit_provider: true,
            require_credentials: true,
            ..SelectionRequest::default()
        }
    }

    #[test]
    fn test_backend_parse_is_case_insensitive() {
        assert_eq!(BackendId::parse("OpenAI"), Some(BackendId::OpenAi));
        assert_eq!(BackendId::parse("apple-translate"), Some(BackendId::AppleTranslate));
        assert_eq!(BackendId::parse("open-responses"), None);
        for id in BackendId::ALL {
            assert_eq!(BackendId::parse(id.as_str()), Some(id));
        }
    }

    #[test]
    fn test_openai_defaults_with_env_key() {
        let selection = factory("", &[("OPENAI_API_KEY", "sk-env")])
            .make(&request("openai"))
            .unwrap();

        assert_eq!(selection.name, "openai");
        assert_eq!(selection.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(selection.base_url.as_deref(), Some("https://api.openai.com"));
        assert_eq!(selection.api_key.as_deref(), Some("sk-env"));
        assert!(!selection.promptless);
        assert_eq!(selection.provider.name(), "openai");
    }

    #[test]
    fn test_key_precedence_cli_config_env() {
        let source = "[providers.openai]\napi_key = \"sk-config\"\nmodel = \"gpt-4o\"\n";
        let env = [("OPENAI_API_KEY", "sk-env")];

        let selection = factory(source, &env).make(&request("openai")).unwrap();
        assert_eq!(selection.api_key.as_deref(), Some("sk-config"));
        assert_eq!(selection.model.as_deref(), Some("gpt-4o"));

        let mut cli = request("openai");
        cli.api_key = Some("sk-cli".into());
        cli.model = Some("o3".into());
        let selection = factory(source, &env).make(&cli).unwrap();
        assert_eq!(selection.api_key.as_deref(), Some("sk-cli"));
        assert_eq!(selection.model.as_deref(), Some("o3"));
    }

    #[test]
    fn test_missing_key_is_runtime_error_unless_dry_run() {
        let err = factory("", &[]).make(&request("anthropic")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Runtime);
        assert_eq!(err.message, "Error: ANTHROPIC_API_KEY is required for provider 'anthropic'.");

        let mut dry = request("anthropic");
        dry.require_credentials = false;
        let selection = factory("", &[]).make(&dry).unwrap();
        assert_eq!(selection.api_key, None);
        assert_eq!(selection.model.as_deref(), Some("claude-3-5-haiku-latest"));
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let selection = factory("", &[]).make(&request("ollama")).unwrap();
        assert_eq!(selection.base_url.as_deref(), Some("http://localhost:11434"));
        assert_eq!(selection.api_key, None);
    }

    #[test]
    fn test_base_url_rejected_for_fixed_backends() {
        let mut req = request("openai");
        req.base_url = Some("http://localhost:1234".into());
        let err = factory("", &[("OPENAI_API_KEY", "k")]).make(&req).unwrap_err();

        assert_eq!(err.kind, ErrorKind::InvalidArguments);
        assert_eq!(
            err.message,
            "--base-url cannot be used with --provider openai. It is only valid for openai-compatible providers."
        );
    }

    #[test]
    fn test_openai_compatible_requires_base_url_and_model() {
        let err = factory("", &[]).make(&request("openai-compatible")).unwrap_err();
        assert_eq!(err.message, "--base-url is required when using openai-compatible.");

        let mut req = request("openai-compatible");
        req.base_url = Some("http://localhost:1234".into());
        let err = factory("", &[]).make(&req).unwrap_err();
        assert_eq!(err.message, "--model is required when using openai-compatible.");

        req.model = Some("qwen".into());
        let selection = factory("", &[]).make(&req).unwrap();
        assert_eq!(selection.backend, Some(BackendId::OpenAiCompatible));
        assert_eq!(selection.base_url.as_deref(), Some("http://localhost:1234"));
    }

    #[test]
    fn test_named_endpoint() {
        let source = r#"
            [providers.openai-compatible.lmstudio]
            base_url = "http://localhost:1234/v1"
            model = "qwen2.5"
        "#;
        let selection = factory(source, &[]).make(&request("lmstudio")).unwrap();

        assert_eq!(selection.name, "lmstudio");
        assert_eq!(selection.backend, None);
        assert_eq!(selection.model.as_deref(), Some("qwen2.5"));
        assert_eq!(selection.provider.name(), "lmstudio");
    }

    #[test]
    fn test_unknown_provider() {
        let err = factory("", &[]).make(&request("nope")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArguments);
        assert_eq!(err.message, "Unknown provider 'nope'. Run translate --help for valid providers.");
    }

    #[test]
    fn test_deepl_is_promptless() {
        let selection = factory("", &[("DEEPL_API_KEY", "abc:fx")])
            .make(&request("deepl"))
            .unwrap();

        assert!(selection.promptless);
        assert_eq!(selection.model, None);
        assert_eq!(selection.base_url.as_deref(), Some("https://api-free.deepl.com"));
    }

    #[test]
    fn test_apple_backends_validate_flags() {
        let mut req = request("apple-translate");
        req.model = Some("x".into());
        let err = factory("", &[]).make(&req).unwrap_err();
        assert_eq!(
            err.message,
            "--model is not applicable for apple-translate. This provider does not use a model."
        );

        let mut req = request("apple-intelligence");
        req.api_key = Some("k".into());
        let err = factory("", &[]).make(&req).unwrap_err();
        assert_eq!(err.message, "--api-key is not applicable for apple-intelligence.");

        let selection = factory("", &[]).make(&request("apple-translate")).unwrap();
        assert!(selection.promptless);
        let selection = factory("", &[]).make(&request("mlx")).unwrap();
        assert!(!selection.promptless);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let selection = factory("", &[("OPENAI_API_KEY", "sk-secret")])
            .make(&request("openai"))
            .unwrap();
        let debug = format!("{selection:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
