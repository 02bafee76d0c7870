//! Translation presets.
//!
//! Built-in presets are hardcoded. User presets live under `[presets.<name>]`
//! in the config file; a user preset that shares a built-in's name overrides
//! it field by field.

use std::collections::BTreeMap;
use std::fmt;

use crate::config::PresetEntry;
use crate::error::AppError;

/// Where a preset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetSource {
    BuiltIn,
    UserDefined,
}

impl fmt::Display for PresetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuiltIn => write!(f, "built-in"),
            Self::UserDefined => write!(f, "user-defined"),
        }
    }
}

/// A built-in preset (not modifiable by users).
#[derive(Debug, Clone)]
pub struct BuiltInPreset {
    pub name: &'static str,
    pub description: &'static str,
    pub system_prompt: &'static str,
    pub user_prompt: &'static str,
}

/// All built-in presets, sorted by name.
pub const BUILTIN_PRESETS: &[BuiltInPreset] = &[
    BuiltInPreset {
        name: "general",
        description: "General-purpose translation",
        system_prompt: "You are a skilled translator with expertise in translating {from} to {to}, preserving the original meaning, tone, and nuance.
Maintain any formatting present in the source text.
Only output the translation. Do not include explanations, commentary, or original text.
Do not wrap your output in backticks or code blocks.",
        user_prompt: "Translate the following {format} from {from} to {to}.{context_block}

<source_text>
{text}
</source_text>",
    },
    BuiltInPreset {
        name: "legal",
        description: "Formal, strict fidelity",
        system_prompt: "You are a professional legal translator with expertise in translating legal and formal documents from {from} to {to}.
Your translation must be faithful to the source: do not paraphrase, simplify, omit, or add content.
Preserve the formal register, legal terminology, and document structure.
Only output the translated text. Do not include explanations, commentary, or wrapping backticks.",
        user_prompt: "Translate the following legal text from {from} to {to}.{context_block}

<source_text>
{text}
</source_text>",
    },
    BuiltInPreset {
        name: "markdown",
        description: "Preserves markdown formatting",
        system_prompt: "You are a skilled translator with extensive experience in translating {from} text to {to} while maintaining all markdown formatting.
Preserve heading levels (e.g. # for H1, ## for H2), bullet points, numbered lists, bold (**text**), italics (*text*), inline code (`code`), code blocks, links, and line breaks exactly as in the source.
Do not translate URLs, href destinations, anchor link targets, image src values, code content, frontmatter keys, or other technical identifiers.
Do not wrap your output in backticks or a code block.",
        user_prompt: "Translate the following markdown from {from} to {to}.{context_block}

<source_text>
{text}
</source_text>",
    },
    BuiltInPreset {
        name: "ui",
        description: "Short UI strings, button labels",
        system_prompt: "You are a translator specializing in software UI copy. Translate {from} text to {to}.
Output concise, natural translations appropriate for buttons, labels, menu items, tooltips, and other interface elements.
Use standard UI conventions and terminology for {to}-speaking users of macOS and iOS.
Only output the translated string. Do not include backticks, quotation marks, or explanation.",
        user_prompt: "Translate the following UI string from {from} to {to}.{context_block}

<source_text>
{text}
</source_text>",
    },
    BuiltInPreset {
        name: "xcode-strings",
        description: "Xcode string catalogs with format specifiers",
        system_prompt: "You are a skilled translator with extensive experience in translating {from} UI text to {to} for macOS and iOS applications.
The text was taken from an Xcode string catalog (.xcstrings).
Preserve all format specifiers such as %@, %lld, %.2f, %1$@, %2$@, %3$@, %1$lld, %2$lld and similar placeholders. Place them at the contextually appropriate position in the translated string.
If there is markdown formatting, keep it intact.
Preserve the meaning and tone appropriate for a macOS/iOS user interface.
If multiple valid translations exist, use the context provided to choose the most natural and idiomatic option for a native {to} speaker.
Only output the translation. Do not include explanations, original text, or wrapping backticks.",
        user_prompt: "Translate the following {from} UI string to {to}.{context_block}

<source_text>
{text}
</source_text>",
    },
];

/// Name of the preset used for string catalog segments.
pub const CATALOG_PRESET: &str = "xcode-strings";

/// A preset after merging user overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetDefinition {
    pub name: String,
    pub source: PresetSource,
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

impl PresetDefinition {
    fn from_builtin(preset: &BuiltInPreset) -> Self {
        Self {
            name: preset.name.to_string(),
            source: PresetSource::BuiltIn,
            description: Some(preset.description.to_string()),
            system_prompt: Some(preset.system_prompt.to_string()),
            system_prompt_file: None,
            user_prompt: Some(preset.user_prompt.to_string()),
            user_prompt_file: None,
            provider: None,
            model: None,
            from: None,
            to: None,
            format: None,
        }
    }

    fn from_entry(name: &str, entry: &PresetEntry) -> Self {
        Self {
            name: name.to_string(),
            source: PresetSource::UserDefined,
            description: entry.description.clone(),
            system_prompt: entry.system_prompt.clone(),
            system_prompt_file: entry.system_prompt_file.clone(),
            user_prompt: entry.user_prompt.clone(),
            user_prompt_file: entry.user_prompt_file.clone(),
            provider: entry.provider.clone(),
            model: entry.model.clone(),
            from: entry.from.clone(),
            to: entry.to.clone(),
            format: entry.format.clone(),
        }
    }

    /// Fills unset fields from the built-in of the same name.
    ///
    /// A user `*_prompt_file` keeps the built-in inline prompt out, so the
    /// file is what gets rendered.
    fn over_builtin(mut self, builtin: &BuiltInPreset) -> Self {
        if self.system_prompt.is_none() && self.system_prompt_file.is_none() {
            self.system_prompt = Some(builtin.system_prompt.to_string());
        }
        if self.user_prompt.is_none() && self.user_prompt_file.is_none() {
            self.user_prompt = Some(builtin.user_prompt.to_string());
        }
        self.description = self
            .description
            .or_else(|| Some(builtin.description.to_string()));
        self
    }
}

/// Looks up a built-in preset by name.
pub fn get_builtin(name: &str) -> Option<&'static BuiltInPreset> {
    BUILTIN_PRESETS.iter().find(|p| p.name == name)
}

/// Returns true if the name is a built-in preset.
pub fn is_builtin(name: &str) -> bool {
    get_builtin(name).is_some()
}

/// Resolves a preset name against user presets, then built-ins.
pub fn resolve_preset(
    name: &str,
    user_presets: &BTreeMap<String, PresetEntry>,
) -> Result<PresetDefinition, AppError> {
    if let Some(entry) = user_presets.get(name) {
        let preset = PresetDefinition::from_entry(name, entry);
        return Ok(match get_builtin(name) {
            Some(builtin) => preset.over_builtin(builtin),
            None => preset,
        });
    }

    get_builtin(name)
        .map(PresetDefinition::from_builtin)
        .ok_or_else(|| {
            AppError::invalid_arguments(format!(
                "Unknown preset '{name}'. Run translate presets list to see available presets."
            ))
        })
}

/// Presets grouped for `presets list`.
#[derive(Debug, Clone)]
pub struct PresetListing {
    /// Built-ins, with any user override applied.
    pub built_in: Vec<PresetDefinition>,
    /// User presets that do not shadow a built-in.
    pub user: Vec<PresetDefinition>,
}

pub fn list_presets(user_presets: &BTreeMap<String, PresetEntry>) -> PresetListing {
    let built_in = BUILTIN_PRESETS
        .iter()
        .map(|builtin| {
            user_presets.get(builtin.name).map_or_else(
                || PresetDefinition::from_builtin(builtin),
                |entry| PresetDefinition::from_entry(builtin.name, entry).over_builtin(builtin),
            )
        })
        .collect();

    let user = user_presets
        .iter()
        .filter(|(name, _)| !is_builtin(name))
        .map(|(name, entry)| PresetDefinition::from_entry(name, entry))
        .collect();

    PresetListing { built_in, user }
}
