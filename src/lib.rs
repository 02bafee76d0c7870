//! # translate - Text, file and string catalog translation CLI
//!
//! `translate` sends text to an LLM or a dedicated translation service and
//! writes the result to stdout, a file, or next to each input file.
//!
//! ## Features
//!
//! - **Many providers**: OpenAI, Anthropic, Gemini, Ollama, DeepL, any
//!   OpenAI-compatible endpoint, and on-device model sessions
//! - **Multi-file input**: globs and file lists translated concurrently with `--jobs`
//! - **Presets**: prompt templates for general, markdown, legal, UI and string catalogs
//! - **String catalogs**: `.xcstrings` files translated segment by segment
//! - **Streaming**: see translations as they arrive with `--stream`
//!
//! ## Quick Start
//!
//! ```bash
//! # Translate inline text
//! translate --to fr "Good morning"
//!
//! # Translate from stdin
//! cat report.md | translate --to ja
//!
//! # Translate every markdown file next to the original
//! translate --to de --jobs 4 "docs/*.md"
//!
//! # Overwrite in place without asking
//! translate --to es --in-place --yes notes.md
//! ```
//!
//! ## Configuration
//!
//! Settings are stored in `~/.config/translate/config.toml`:
//!
//! ```toml
//! [defaults]
//! provider = "anthropic"
//! to = "ja"
//! jobs = 4
//!
//! [network]
//! timeout_seconds = 60
//!
//! [providers.openai-compatible.lmstudio]
//! base_url = "http://localhost:1234"
//! model = "qwen2.5"
//!
//! [presets.terse]
//! system_prompt = "Translate {from} to {to}. Be terse."
//! ```

/// Xcode string catalog model and batch segment translation.
pub mod catalog;

/// Command-line interface definitions and handlers.
pub mod cli;

/// Configuration file model, storage and resolution.
pub mod config;

/// Error kinds and process exit codes.
pub mod error;

/// Output planning, scheduling, writing and reporting.
pub mod execution;

/// File system utilities.
pub mod fs;

/// Input resolution from arguments, globs and stdin.
pub mod input;

/// Terminal output sink and tracing setup.
pub mod output;

/// Config file location and path expansion.
pub mod paths;

/// Translation backends, HTTP transport and retry policy.
pub mod provider;

/// Languages, presets and prompt templates.
pub mod translation;

/// Terminal UI components (spinner, colors).
pub mod ui;
