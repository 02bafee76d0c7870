//! Languages, presets and prompt templates.

mod dry_run;
mod language;
mod preset;
mod prompt;

pub use dry_run::{DryRun, render_catalog_dry_run};
pub use language::{
    NormalizedLanguage, SOURCE_LANGUAGE_PLACEHOLDER, SUPPORTED_LANGUAGES, normalize_from,
    normalize_to, print_languages,
};
pub use preset::{
    BUILTIN_PRESETS, BuiltInPreset, CATALOG_PRESET, PresetDefinition, PresetListing, PresetSource,
    get_builtin, is_builtin, list_presets, resolve_preset,
};
pub use prompt::{
    MISSING_PLACEHOLDERS_WARNING, NO_LANG_WARNING, PromptContext, PromptOverrides,
    ResolvedPromptSet, render_template, resolve_prompts, strip_code_fence,
};
