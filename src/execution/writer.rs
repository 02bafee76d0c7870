use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::confirm::ConfirmationPrompter;
use super::planner::OutputMode;
use crate::fs::atomic_write;
use crate::output::Terminal;

/// Writes translated text to stdout or files.
pub struct OutputWriter<'a> {
    terminal: &'a dyn Terminal,
    prompter: ConfirmationPrompter,
    /// Set in in-place mode, where one confirmation covers every file.
    skip_overwrite_confirmation: bool,
}

impl<'a> OutputWriter<'a> {
    pub fn new(terminal: &'a dyn Terminal, prompter: ConfirmationPrompter) -> Self {
        Self {
            terminal,
            prompter,
            skip_overwrite_confirmation: false,
        }
    }

    #[must_use]
    pub const fn skip_overwrite_confirmation(mut self, skip: bool) -> Self {
        self.skip_overwrite_confirmation = skip;
        self
    }

    /// Writes one translation to its planned destination.
    ///
    /// `destination` is only consulted for per-file output. Returns the file
    /// written, `None` for stdout.
    pub fn write(&self, text: &str, mode: &OutputMode, destination: Option<&Path>) -> Result<Option<PathBuf>> {
        match mode {
            OutputMode::Stdout => {
                self.terminal
                    .write_stdout(&with_trailing_newline(text))
                    .context("Failed to write to stdout")?;
                Ok(None)
            }
            OutputMode::SingleFile(path) => {
                self.write_file(text, path)?;
                Ok(Some(path.clone()))
            }
            OutputMode::PerFile { .. } => {
                let Some(path) = destination else {
                    anyhow::bail!("No output target was planned for this file.");
                };
                self.write_file(text, path)?;
                Ok(Some(path.to_path_buf()))
            }
        }
    }

    /// Atomically writes `text`, asking first if `destination` exists.
    pub fn write_file(&self, text: &str, destination: &Path) -> Result<()> {
        if destination.exists() && !self.skip_overwrite_confirmation {
            let name = destination
                .file_name()
                .map_or_else(|| destination.display().to_string(), |n| n.to_string_lossy().into_owned());
            self.prompter
                .confirm(&format!("Output file '{name}' already exists. Overwrite?"))?;
        }
        atomic_write(destination, text)?;
        tracing::debug!(path = %destination.display(), bytes = text.len(), "translation written");
        Ok(())
    }
}

fn with_trailing_newline(text: &str) -> String {
    if text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{text}\n")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::execution::confirm::tests::FixedConfirmer;
    use crate::output::MemoryTerminal;
    use std::fs;
    use tempfile::TempDir;

    fn prompter(answer: bool) -> ConfirmationPrompter {
        ConfirmationPrompter::with_confirmer(false, true, FixedConfirmer::new(answer))
    }

    #[test]
    fn test_stdout_gets_trailing_newline() {
        let terminal = MemoryTerminal::new();
        let writer = OutputWriter::new(&terminal, prompter(false));
        assert_eq!(writer.write("Bonjour", &OutputMode::Stdout, None).unwrap(), None);
        writer.write("Salut\n", &OutputMode::Stdout, None).unwrap();
        assert_eq!(terminal.stdout(), "Bonjour\nSalut\n");
    }

    #[test]
    fn test_stdout_write_failure_is_reported() {
        let terminal = MemoryTerminal::new().with_broken_stdout();
        let writer = OutputWriter::new(&terminal, prompter(false));

        let err = writer.write("Bonjour", &OutputMode::Stdout, None).unwrap_err();
        assert!(err.to_string().contains("Failed to write to stdout"));
    }

    #[test]
    fn test_single_file_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/fr.txt");
        let terminal = MemoryTerminal::new();
        let writer = OutputWriter::new(&terminal, prompter(false));

        let written = writer
            .write("Bonjour", &OutputMode::SingleFile(path.clone()), None)
            .unwrap();
        assert_eq!(written, Some(path.clone()));
        assert_eq!(fs::read_to_string(path).unwrap(), "Bonjour");
    }

    #[test]
    fn test_existing_file_declined() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fr.txt");
        fs::write(&path, "old").unwrap();
        let terminal = MemoryTerminal::new();
        let writer = OutputWriter::new(&terminal, prompter(false));

        let err = writer.write_file("new", &path).unwrap_err();
        assert_eq!(err.downcast_ref::<AppError>().unwrap().message, "Aborted.");
        assert_eq!(fs::read_to_string(path).unwrap(), "old");
    }

    #[test]
    fn test_existing_file_skip_confirmation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.md");
        fs::write(&path, "old").unwrap();
        let terminal = MemoryTerminal::new();
        let writer = OutputWriter::new(&terminal, prompter(false)).skip_overwrite_confirmation(true);

        writer.write_file("new", &path).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "new");
    }

    #[test]
    fn test_per_file_without_destination() {
        let terminal = MemoryTerminal::new();
        let writer = OutputWriter::new(&terminal, prompter(true));
        let mode = OutputMode::PerFile {
            targets: Vec::new(),
            in_place: false,
        };
        let err = writer.write("x", &mode, None).unwrap_err();
        assert_eq!(err.to_string(), "No output target was planned for this file.");
    }
}
