//! `--dry-run` reports. Nothing here touches the network.

use std::fmt::Write as _;

use super::{NormalizedLanguage, ResolvedPromptSet, SOURCE_LANGUAGE_PLACEHOLDER};
use crate::input::ResolvedInputFile;

const PREVIEW_CHARS: usize = 500;

/// Everything shown for a text translation dry run.
#[derive(Debug, Clone)]
pub struct DryRun<'a> {
    pub provider: &'a str,
    pub model: Option<&'a str>,
    pub from: &'a NormalizedLanguage,
    pub to: &'a NormalizedLanguage,
    pub prompts: &'a ResolvedPromptSet,
    pub input: &'a str,
}

impl DryRun<'_> {
    pub fn render(&self) -> String {
        let preview: String = self.input.chars().take(PREVIEW_CHARS).collect();
        let ellipsis = if self.input.chars().count() > PREVIEW_CHARS {
            "..."
        } else {
            ""
        };
        let source = if self.from.is_auto {
            format!("{SOURCE_LANGUAGE_PLACEHOLDER} (auto-detect)")
        } else {
            self.from.display_name.clone()
        };

        format!(
            "=== DRY RUN ===\n\n\
             Provider:       {}\n\
             Model:          {}\n\
             Source lang:    {source}\n\
             Target lang:    {}\n\n\
             --- SYSTEM PROMPT ---\n{}\n\n\
             --- USER PROMPT ---\n{}\n\n\
             --- INPUT (first 500 chars) ---\n{preview}{ellipsis}",
            self.provider,
            self.model.unwrap_or("(provider default)"),
            self.to.display_name,
            self.prompts.system_prompt,
            self.prompts.user_prompt,
        )
    }
}

/// Dry-run summary for string catalog inputs.
pub fn render_catalog_dry_run(
    provider: &str,
    model: Option<&str>,
    to: &NormalizedLanguage,
    jobs: usize,
    files: &[ResolvedInputFile],
) -> String {
    let mut out = String::from("--- DRY RUN ---\nMode: .xcstrings catalog translation\n");
    let _ = writeln!(out, "Provider: {provider}");
    let _ = writeln!(out, "Model: {}", model.unwrap_or("n/a"));
    let _ = writeln!(out, "Target language: {} ({})", to.display_name, to.provider_code);
    let _ = writeln!(out, "Max concurrent catalog requests: {}", jobs.max(1));
    out.push_str("Files:");
    for file in files {
        let _ = write!(out, "\n- {}", file.path.display());
    }
    out
}
