//! Prompt template resolution and rendering.

use std::fs;
use std::path::Path;

use super::NormalizedLanguage;
use super::preset::{PresetDefinition, PresetSource};
use crate::error::AppError;
use crate::input::ResolvedFormat;
use crate::paths::expand_path;

pub const NO_LANG_WARNING: &str = "--no-lang has no effect when using default prompts.";
pub const MISSING_PLACEHOLDERS_WARNING: &str = "Your custom prompt does not contain {from} or {to} placeholders. \
     If you have hardcoded languages, pass --no-lang to suppress this warning.";

/// System and user templates for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPromptSet {
    pub system_prompt: String,
    pub user_prompt: String,
    /// Whether anything other than an unmodified built-in preset supplied the templates.
    pub custom_prompt_active: bool,
}

impl ResolvedPromptSet {
    /// The system prompt, or `None` when blank.
    pub fn system(&self) -> Option<String> {
        non_blank(&self.system_prompt)
    }

    pub fn user(&self) -> Option<String> {
        non_blank(&self.user_prompt)
    }

    /// Substitutes placeholders in both templates.
    #[must_use]
    pub fn render(&self, context: &PromptContext<'_>) -> Self {
        Self {
            system_prompt: render_template(&self.system_prompt, context),
            user_prompt: render_template(&self.user_prompt, context),
            custom_prompt_active: self.custom_prompt_active,
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    (!value.trim().is_empty()).then(|| value.to_string())
}

/// Values available to templates.
#[derive(Debug, Clone)]
pub struct PromptContext<'a> {
    pub text: &'a str,
    pub from: &'a NormalizedLanguage,
    pub to: &'a NormalizedLanguage,
    pub context: &'a str,
    pub filename: &'a str,
    pub format: ResolvedFormat,
}

/// Flags that can replace the preset's templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptOverrides<'a> {
    /// `--system-prompt`, inline or `@path`.
    pub system_prompt: Option<&'a str>,
    /// `--user-prompt`, inline or `@path`.
    pub user_prompt: Option<&'a str>,
    pub no_lang: bool,
}

/// Picks the templates for a preset and flags, returning them with any warnings.
///
/// # Errors
///
/// Returns a runtime error if an `@path` template cannot be read.
pub fn resolve_prompts(
    preset: &PresetDefinition,
    overrides: PromptOverrides<'_>,
    cwd: &Path,
    home: &Path,
) -> Result<(ResolvedPromptSet, Vec<String>), AppError> {
    let system_prompt = resolve_template(
        overrides.system_prompt,
        preset.system_prompt.as_deref(),
        preset.system_prompt_file.as_deref(),
        cwd,
        home,
        "system",
    )?;
    let user_prompt = resolve_template(
        overrides.user_prompt,
        preset.user_prompt.as_deref(),
        preset.user_prompt_file.as_deref(),
        cwd,
        home,
        "user",
    )?;

    let custom_prompt_active = overrides.system_prompt.is_some()
        || overrides.user_prompt.is_some()
        || preset.system_prompt_file.is_some()
        || preset.user_prompt_file.is_some()
        || preset.source == PresetSource::UserDefined;

    let mut warnings = Vec::new();
    if overrides.no_lang && !custom_prompt_active {
        warnings.push(NO_LANG_WARNING.to_string());
    }
    if custom_prompt_active && !overrides.no_lang {
        let mentions_language = [&system_prompt, &user_prompt]
            .iter()
            .any(|t| t.contains("{from}") || t.contains("{to}"));
        if !mentions_language {
            warnings.push(MISSING_PLACEHOLDERS_WARNING.to_string());
        }
    }

    Ok((
        ResolvedPromptSet {
            system_prompt,
            user_prompt,
            custom_prompt_active,
        },
        warnings,
    ))
}

fn resolve_template(
    override_value: Option<&str>,
    preset_inline: Option<&str>,
    preset_file: Option<&str>,
    cwd: &Path,
    home: &Path,
    label: &str,
) -> Result<String, AppError> {
    if let Some(value) = override_value {
        return inline_or_file(value, cwd, home, label);
    }
    if let Some(inline) = preset_inline {
        return Ok(inline.to_string());
    }
    if let Some(file) = preset_file {
        return read_template(file, cwd, home, label);
    }
    Ok(String::new())
}

fn inline_or_file(value: &str, cwd: &Path, home: &Path, label: &str) -> Result<String, AppError> {
    value
        .strip_prefix('@')
        .map_or_else(|| Ok(value.to_string()), |path| read_template(path, cwd, home, label))
}

fn read_template(raw_path: &str, cwd: &Path, home: &Path, label: &str) -> Result<String, AppError> {
    let path = expand_path(raw_path, cwd, home);
    if !path.is_file() {
        return Err(AppError::runtime(format!("Prompt file '{raw_path}' not found.")));
    }
    fs::read_to_string(&path).map_err(|e| {
        AppError::runtime(format!(
            "Error: Failed to read {label} prompt file '{raw_path}': {e}"
        ))
    })
}

/// Substitutes `{name}` placeholders in one pass.
///
/// Substituted values are never rescanned, so a `{to}` inside the source text
/// survives. Unknown placeholders are left as written.
pub fn render_template(template: &str, context: &PromptContext<'_>) -> String {
    let trimmed_context = context.context.trim();
    let lookup = |name: &str| -> Option<String> {
        Some(match name {
            "from" => context.from.prompt_name().to_string(),
            "to" => context.to.display_name.clone(),
            "text" => context.text.to_string(),
            "context" => trimmed_context.to_string(),
            "context_block" if trimmed_context.is_empty() => String::new(),
            "context_block" => format!("\nAdditional context: {trimmed_context}"),
            "filename" => context.filename.to_string(),
            "format" => context.format.prompt_value().to_string(),
            _ => return None,
        })
    };

    let mut out = String::with_capacity(template.len() + context.text.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replacement = after
            .find('}')
            .and_then(|close| lookup(&after[..close]).map(|value| (value, close)));

        match replacement {
            Some((value, close)) => {
                out.push_str(&value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Removes a single code fence wrapping the whole response.
///
/// Returns the text unchanged (and `false`) unless the trimmed response both
/// starts with a ```` ``` ```` line and ends with a bare ```` ``` ```` line.
pub fn strip_code_fence(text: &str) -> (String, bool) {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return (text.to_string(), false);
    }

    let lines: Vec<&str> = trimmed.lines().collect();
    let [first, body @ .., last] = lines.as_slice() else {
        return (text.to_string(), false);
    };
    if !first.trim().starts_with("```") || last.trim() != "```" {
        return (text.to_string(), false);
    }
    (body.join("\n"), true)
}
