//! Configuration file model, storage and resolution.
//!
//! The file is TOML. [`ConfigFile`] is the typed view used for translation;
//! the raw [`toml::Table`] is kept alongside it so `translate config` can get,
//! set and unset arbitrary dotted keys without losing unknown content.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

mod key_path;
mod manager;
mod resolve;

pub use key_path::{get_value, parse_scalar, set_value, to_printable, unset_value};
pub use manager::ConfigManager;
pub use resolve::{
    Defaults, ResolvedConfig, builtin_defaults, collision_warnings, effective_table,
};

/// `[defaults]`: fallback values for translation flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultsSection {
    pub provider: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub preset: Option<String>,
    /// `auto`, `text`, `markdown` or `html`.
    pub format: Option<String>,
    pub stream: Option<bool>,
    pub yes: Option<bool>,
    pub jobs: Option<i64>,
}

/// `[network]`: timeout and retry settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSection {
    pub timeout_seconds: Option<i64>,
    pub retries: Option<i64>,
    pub retry_base_delay_seconds: Option<i64>,
}

/// Connection settings for one backend or named endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

/// `[providers.<name>]`.
///
/// Only `[providers.openai-compatible]` uses `endpoints`: each sub-table is a
/// named endpoint selectable with `--provider <name>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSection {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    #[serde(flatten)]
    pub endpoints: BTreeMap<String, ProviderEntry>,
}

impl ProviderSection {
    pub fn entry(&self) -> ProviderEntry {
        ProviderEntry {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            api_key: self.api_key.clone(),
        }
    }
}

/// `[presets.<name>]`: a user-defined preset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetEntry {
    pub description: Option<String>,
    pub system_prompt: Option<String>,
    pub system_prompt_file: Option<String>,
    pub user_prompt: Option<String>,
    pub user_prompt_file: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub format: Option<String>,
}

/// The complete configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub defaults: DefaultsSection,
    #[serde(default)]
    pub network: NetworkSection,
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderSection>,
    #[serde(default)]
    pub presets: BTreeMap<String, PresetEntry>,
}

impl ConfigFile {
    /// Interprets a raw table.
    pub fn from_table(table: &toml::Table) -> Result<Self, toml::de::Error> {
        toml::Value::Table(table.clone()).try_into()
    }
}
