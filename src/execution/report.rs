//! Verbose metadata and the multi-file summary.

use std::path::{Path, PathBuf};

use crate::input::ResolvedInputFile;
use crate::output::Terminal;
use crate::provider::Usage;

pub const FENCE_STRIPPED_MESSAGE: &str = "Stripped wrapping code fence from LLM response.";

/// Outcome of translating one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationFileResult {
    pub file: ResolvedInputFile,
    pub destination: Option<PathBuf>,
    pub success: bool,
    pub error_message: Option<String>,
}

impl TranslationFileResult {
    pub const fn succeeded(file: ResolvedInputFile, destination: Option<PathBuf>) -> Self {
        Self {
            file,
            destination,
            success: true,
            error_message: None,
        }
    }

    pub fn failed(file: ResolvedInputFile, message: impl Into<String>) -> Self {
        Self {
            file,
            destination: None,
            success: false,
            error_message: Some(message.into()),
        }
    }
}

/// Per-translation details printed under `--verbose`.
#[derive(Clone, Copy)]
pub struct Reporter<'a> {
    pub terminal: &'a dyn Terminal,
    pub provider: &'a str,
    pub model: Option<&'a str>,
}

impl Reporter<'_> {
    pub fn fence_stripped(&self) {
        if self.terminal.is_verbose() {
            self.terminal.info(FENCE_STRIPPED_MESSAGE);
        }
    }

    pub fn metadata(&self, usage: Option<Usage>, elapsed_ms: u128, destination: Option<&Path>) {
        if !self.terminal.is_verbose() {
            return;
        }
        let t = self.terminal;
        t.info(&format!("Provider: {}", self.provider));
        t.info(&format!("Model: {}", self.model.unwrap_or("(provider default)")));
        match usage {
            Some(usage) => {
                let count = |n: Option<u64>| n.map_or_else(|| "n/a".to_string(), |n| n.to_string());
                t.info(&format!(
                    "Tokens: input={}, output={}",
                    count(usage.input_tokens),
                    count(usage.output_tokens)
                ));
            }
            None => t.info("Tokens: unavailable"),
        }
        t.info(&format!("Elapsed: {elapsed_ms}ms"));
        t.info(&format!(
            "Output: {}",
            destination.map_or_else(|| "stdout".to_string(), |p| p.display().to_string())
        ));
    }
}

/// Prints the failure summary. Returns whether any file failed.
pub fn summarize(terminal: &dyn Terminal, results: &[TranslationFileResult]) -> bool {
    let failed: Vec<_> = results.iter().filter(|r| !r.success).collect();
    if failed.is_empty() {
        return false;
    }

    terminal.error(&format!(
        "Translation complete: {} succeeded, {} failed.",
        results.len() - failed.len(),
        failed.len()
    ));
    terminal.error("Failed files:");
    for result in failed {
        terminal.error(&format!(
            "  - {}: {}",
            result.file.display_name(),
            result.error_message.as_deref().unwrap_or("unknown error")
        ));
    }
    true
}
