//! Terminal output sink and diagnostic logging setup.
//!
//! Everything user-facing is written through a [`Terminal`] handed down from
//! `main`, so the orchestration, scheduler and writers can be exercised in
//! tests against a [`MemoryTerminal`] instead of the real stdout/stderr.
//!
//! ## Routing
//!
//! - Translation output goes to stdout (for piping)
//! - Info, warnings and errors go to stderr
//! - Quiet mode suppresses info and warnings
//! - Colors can be disabled via the `NO_COLOR` environment variable
//!
//! Developer diagnostics (retry timing, task scheduling) use `tracing` and are
//! enabled with `TRANSLATE_LOG` or `--verbose`.

use std::io::{self, IsTerminal, Write};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::ui::Style;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "TRANSLATE_LOG";

/// Output configuration settings.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Suppress info and warning output.
    pub quiet: bool,
    /// Emit per-translation metadata.
    pub verbose: bool,
    /// Disable colored output.
    pub no_color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            quiet: false,
            verbose: false,
            // https://no-color.org/
            no_color: std::env::var_os("NO_COLOR").is_some(),
        }
    }
}

/// Destination for everything the tool prints.
pub trait Terminal: Send + Sync {
    /// Writes raw text to stdout without adding a newline.
    fn write_stdout(&self, text: &str) -> io::Result<()>;

    /// Writes one line to stderr.
    fn write_stderr(&self, line: &str);

    fn is_quiet(&self) -> bool;

    fn is_verbose(&self) -> bool;

    fn stdin_is_tty(&self) -> bool;

    /// Writes text to stdout followed by a newline.
    fn print_line(&self, text: &str) -> io::Result<()> {
        self.write_stdout(&format!("{text}\n"))
    }

    fn info(&self, text: &str) {
        if !self.is_quiet() {
            self.write_stderr(&format!("Info: {text}"));
        }
    }

    fn warn(&self, text: &str) {
        if !self.is_quiet() {
            self.write_stderr(&format!("Warning: {text}"));
        }
    }

    fn error(&self, text: &str) {
        self.write_stderr(text);
    }
}

/// The process stdout/stderr.
#[derive(Debug, Clone, Default)]
pub struct ConsoleTerminal {
    config: OutputConfig,
}

impl ConsoleTerminal {
    pub const fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    fn label(&self, label: &str, styled: fn(&str) -> String) -> String {
        if self.config.no_color {
            label.to_string()
        } else {
            styled(label)
        }
    }
}

impl Terminal for ConsoleTerminal {
    fn write_stdout(&self, text: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()
    }

    fn write_stderr(&self, line: &str) {
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "{line}");
    }

    fn is_quiet(&self) -> bool {
        self.config.quiet
    }

    fn is_verbose(&self) -> bool {
        self.config.verbose
    }

    fn stdin_is_tty(&self) -> bool {
        io::stdin().is_terminal()
    }

    fn info(&self, text: &str) {
        if !self.config.quiet {
            let label = self.label("Info:", |s| Style::secondary(s));
            self.write_stderr(&format!("{label} {text}"));
        }
    }

    fn warn(&self, text: &str) {
        if !self.config.quiet {
            let label = self.label("Warning:", |s| Style::warning(s));
            self.write_stderr(&format!("{label} {text}"));
        }
    }
}

/// In-memory terminal that records output, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryTerminal {
    quiet: bool,
    verbose: bool,
    stdin_tty: bool,
    stdout_broken: bool,
    stdout: Mutex<String>,
    stderr: Mutex<Vec<String>>,
}

impl MemoryTerminal {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    #[must_use]
    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub const fn with_tty_stdin(mut self, tty: bool) -> Self {
        self.stdin_tty = tty;
        self
    }

    /// Makes every stdout write fail with `BrokenPipe`.
    #[must_use]
    pub const fn with_broken_stdout(mut self) -> Self {
        self.stdout_broken = true;
        self
    }

    pub fn stdout(&self) -> String {
        self.stdout.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn stderr_lines(&self) -> Vec<String> {
        self.stderr.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl Terminal for MemoryTerminal {
    fn write_stdout(&self, text: &str) -> io::Result<()> {
        if self.stdout_broken {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe));
        }
        if let Ok(mut out) = self.stdout.lock() {
            out.push_str(text);
        }
        Ok(())
    }

    fn write_stderr(&self, line: &str) {
        if let Ok(mut lines) = self.stderr.lock() {
            lines.push(line.to_string());
        }
    }

    fn is_quiet(&self) -> bool {
        self.quiet
    }

    fn is_verbose(&self) -> bool {
        self.verbose
    }

    fn stdin_is_tty(&self) -> bool {
        self.stdin_tty
    }
}

/// Installs the global `tracing` subscriber writing to stderr.
///
/// `TRANSLATE_LOG` takes precedence; otherwise `debug` when verbose and `warn`
/// by default. Calling this more than once is harmless.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_config_default_not_quiet() {
        let config = OutputConfig::default();
        assert!(!config.quiet);
        assert!(!config.verbose);
    }

    #[test]
    fn test_memory_terminal_prefixes_info_and_warn() {
        let terminal = MemoryTerminal::new();
        terminal.info("hello");
        terminal.warn("careful");
        terminal.error("Error: boom");

        assert_eq!(
            terminal.stderr_lines(),
            vec!["Info: hello", "Warning: careful", "Error: boom"]
        );
    }

    #[test]
    fn test_memory_terminal_quiet_suppresses_info_and_warn_only() {
        let terminal = MemoryTerminal::new().quiet(true);
        terminal.info("hello");
        terminal.warn("careful");
        terminal.error("still shown");

        assert_eq!(terminal.stderr_lines(), vec!["still shown"]);
    }

    #[test]
    fn test_print_line_appends_newline() {
        let terminal = MemoryTerminal::new();
        terminal.write_stdout("a").unwrap();
        terminal.print_line("b").unwrap();
        assert_eq!(terminal.stdout(), "ab\n");
    }

    #[test]
    fn test_broken_stdout_reports_error() {
        let terminal = MemoryTerminal::new().with_broken_stdout();
        let err = terminal.print_line("lost").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert!(terminal.stdout().is_empty());
    }
}
