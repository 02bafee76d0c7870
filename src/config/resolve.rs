//! Flattens a [`ConfigFile`] into the values translation actually uses.

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::{ConfigFile, PresetEntry, ProviderEntry};
use crate::input::FormatHint;
use crate::provider::{BackendId, NetworkConfig};

/// `[defaults]` after applying built-in fallbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
    pub provider: String,
    pub from: String,
    pub to: String,
    pub preset: String,
    pub format: FormatHint,
    pub stream: bool,
    pub yes: bool,
    pub jobs: usize,
}

/// Built-in defaults used when the config file says nothing.
pub fn builtin_defaults() -> Defaults {
    Defaults {
        provider: "openai".to_string(),
        from: "auto".to_string(),
        to: "en".to_string(),
        preset: "general".to_string(),
        format: FormatHint::Auto,
        stream: false,
        yes: false,
        jobs: 1,
    }
}

/// The configuration cascade's file and built-in layers, flattened.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub path: PathBuf,
    pub table: toml::Table,
    pub defaults: Defaults,
    pub network: NetworkConfig,
    /// `[providers.<name>]` connection settings, keyed by section name.
    pub providers: BTreeMap<String, ProviderEntry>,
    /// `[providers.openai-compatible.<name>]` endpoints.
    pub named_endpoints: BTreeMap<String, ProviderEntry>,
    pub presets: BTreeMap<String, PresetEntry>,
}

impl ResolvedConfig {
    pub fn new(path: PathBuf, table: toml::Table, file: ConfigFile) -> Self {
        let builtin = builtin_defaults();
        let ConfigFile {
            defaults,
            network,
            providers,
            presets,
        } = file;

        let format = defaults
            .format
            .as_deref()
            .and_then(FormatHint::parse)
            .unwrap_or(builtin.format);

        let defaults = Defaults {
            provider: defaults.provider.unwrap_or(builtin.provider),
            from: defaults.from.unwrap_or(builtin.from),
            to: defaults.to.unwrap_or(builtin.to),
            preset: defaults.preset.unwrap_or(builtin.preset),
            format,
            stream: defaults.stream.unwrap_or(builtin.stream),
            yes: defaults.yes.unwrap_or(builtin.yes),
            jobs: defaults.jobs.map_or(builtin.jobs, |j| j.max(1) as usize),
        };

        let network = NetworkConfig::clamped(
            network
                .timeout_seconds
                .unwrap_or(NetworkConfig::DEFAULT_TIMEOUT_SECONDS),
            network.retries.unwrap_or(NetworkConfig::DEFAULT_RETRIES),
            network
                .retry_base_delay_seconds
                .unwrap_or(NetworkConfig::DEFAULT_RETRY_BASE_DELAY_SECONDS),
        );

        let named_endpoints = providers
            .get(BackendId::OpenAiCompatible.as_str())
            .map(|section| section.endpoints.clone())
            .unwrap_or_default();
        let providers = providers
            .into_iter()
            .map(|(name, section)| (name, section.entry()))
            .collect();

        Self {
            path,
            table,
            defaults,
            network,
            providers,
            named_endpoints,
            presets,
        }
    }

    /// Settings for a built-in backend, empty when unconfigured.
    pub fn provider_entry(&self, backend: BackendId) -> ProviderEntry {
        self.providers
            .get(backend.as_str())
            .cloned()
            .unwrap_or_default()
    }
}

/// One warning per named endpoint shadowed by a built-in backend.
pub fn collision_warnings(config: &ResolvedConfig) -> Vec<String> {
    config
        .named_endpoints
        .keys()
        .filter(|name| BackendId::parse(name).is_some())
        .map(|name| {
            format!(
                "Named endpoint '{name}' in config has the same name as a built-in provider and \
                 will never be used. Rename the endpoint to avoid this conflict."
            )
        })
        .collect()
}

/// The table printed by `config show`: resolved defaults and network, raw providers and presets.
pub fn effective_table(config: &ResolvedConfig) -> toml::Table {
    use toml::Value;

    let d = &config.defaults;
    let mut defaults = toml::Table::new();
    defaults.insert("provider".into(), Value::String(d.provider.clone()));
    defaults.insert("from".into(), Value::String(d.from.clone()));
    defaults.insert("to".into(), Value::String(d.to.clone()));
    defaults.insert("preset".into(), Value::String(d.preset.clone()));
    defaults.insert("format".into(), Value::String(d.format.as_str().to_string()));
    defaults.insert("stream".into(), Value::Boolean(d.stream));
    defaults.insert("yes".into(), Value::Boolean(d.yes));
    defaults.insert("jobs".into(), Value::Integer(d.jobs as i64));

    let n = &config.network;
    let mut network = toml::Table::new();
    network.insert("timeout_seconds".into(), Value::Integer(n.timeout_seconds as i64));
    network.insert("retries".into(), Value::Integer(i64::from(n.retries)));
    network.insert(
        "retry_base_delay_seconds".into(),
        Value::Integer(n.retry_base_delay_seconds as i64),
    );

    let mut out = toml::Table::new();
    out.insert("defaults".into(), Value::Table(defaults));
    out.insert("network".into(), Value::Table(network));
    for section in ["providers", "presets"] {
        if let Some(value @ Value::Table(_)) = config.table.get(section) {
            out.insert(section.into(), value.clone());
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn resolve(source: &str) -> ResolvedConfig {
        let table: toml::Table = source.parse().unwrap();
        let file = ConfigFile::from_table(&table).unwrap();
        ResolvedConfig::new(PathBuf::from("/tmp/config.toml"), table, file)
    }

    #[test]
    fn test_empty_config_uses_builtin_defaults() {
        let config = resolve("");
        assert_eq!(config.defaults, builtin_defaults());
        assert_eq!(config.network, NetworkConfig::default());
        assert!(config.named_endpoints.is_empty());
    }

    #[test]
    fn test_values_are_clamped() {
        let config = resolve(
            "[defaults]\njobs = 0\n[network]\ntimeout_seconds = -5\nretries = -1\nretry_base_delay_seconds = 0\n",
        );
        assert_eq!(config.defaults.jobs, 1);
        assert_eq!(config.network.timeout_seconds, 1);
        assert_eq!(config.network.retries, 0);
        assert_eq!(config.network.retry_base_delay_seconds, 1);
    }

    #[test]
    fn test_invalid_format_falls_back_to_auto() {
        let config = resolve("[defaults]\nformat = \"pdf\"\n");
        assert_eq!(config.defaults.format, FormatHint::Auto);

        let config = resolve("[defaults]\nformat = \"markdown\"\n");
        assert_eq!(config.defaults.format, FormatHint::Markdown);
    }

    #[test]
    fn test_named_endpoints_and_collisions() {
        let config = resolve(
            r#"
            [providers.openai-compatible.lmstudio]
            base_url = "http://localhost:1234"
            model = "qwen"

            [providers.openai-compatible.openai]
            base_url = "http://shadowed"
            "#,
        );

        assert_eq!(config.named_endpoints.len(), 2);
        assert_eq!(
            config.named_endpoints["lmstudio"].base_url.as_deref(),
            Some("http://localhost:1234")
        );

        let warnings = collision_warnings(&config);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Named endpoint 'openai' in config"));
    }

    #[test]
    fn test_effective_table_merges_defaults() {
        let config = resolve("[defaults]\nto = \"fr\"\n[presets.terse]\nsystem_prompt = \"Short.\"\n");
        let table = effective_table(&config);

        assert_eq!(table["defaults"]["to"].as_str(), Some("fr"));
        assert_eq!(table["defaults"]["provider"].as_str(), Some("openai"));
        assert_eq!(table["network"]["retries"].as_integer(), Some(3));
        assert_eq!(table["presets"]["terse"]["system_prompt"].as_str(), Some("Short."));
        assert!(!table.contains_key("providers"));
    }
}
