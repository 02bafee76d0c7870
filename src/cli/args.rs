use clap::{Parser, Subcommand};

use crate::input::FormatHint;

#[derive(Parser, Debug)]
#[command(name = "translate")]
#[command(about = "Translate text, files and string catalogs with LLM and translation providers")]
#[command(version)]
pub struct Args {
    /// Text, file paths or glob patterns (reads stdin if not provided)
    pub input: Vec<String>,

    /// Treat the single argument as literal text, even if a file exists with that name
    #[arg(long)]
    pub text: bool,

    /// Write output to this file (single input only)
    #[arg(short = 'o', long)]
    pub output: Option<String>,

    /// Overwrite input files with their translation
    #[arg(short = 'i', long)]
    pub in_place: bool,

    /// Suffix inserted before the extension of output files (default: _<LANG>)
    #[arg(long)]
    pub suffix: Option<String>,

    /// Stream output as it arrives
    #[arg(long)]
    pub stream: bool,

    /// Skip confirmation prompts
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Maximum number of concurrent requests for multi-file input
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Source language (default: auto)
    #[arg(short = 'f', long)]
    pub from: Option<String>,

    /// Target language (name or code, e.g. French, fr, zh-Hant)
    #[arg(short = 't', long)]
    pub to: Option<String>,

    /// Provider (openai, anthropic, gemini, ollama, openai-compatible, deepl,
    /// coreml, mlx, llama, apple-intelligence, apple-translate, or a named endpoint)
    #[arg(short = 'p', long)]
    pub provider: Option<String>,

    /// Model name
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// Base URL of an openai-compatible endpoint
    #[arg(long)]
    pub base_url: Option<String>,

    /// API key (overrides config and environment)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Preset name
    #[arg(long)]
    pub preset: Option<String>,

    /// System prompt template, or @path to a template file
    #[arg(long)]
    pub system_prompt: Option<String>,

    /// User prompt template, or @path to a template file
    #[arg(long)]
    pub user_prompt: Option<String>,

    /// Additional context for the translator
    #[arg(short = 'c', long)]
    pub context: Option<String>,

    /// Do not warn when custom prompts omit {from} and {to}
    #[arg(long)]
    pub no_lang: bool,

    /// Input format hint
    #[arg(long, value_enum)]
    pub format: Option<FormatHint>,

    /// Show what would be sent without calling the provider
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Options accepted before or after any subcommand.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Suppress warnings and informational messages
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Print provider, model, token usage and timing
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage and inspect presets
    Presets {
        #[command(subcommand)]
        command: PresetsCommand,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// List supported language codes
    Languages,
}

#[derive(Subcommand, Debug)]
pub enum PresetsCommand {
    /// List built-in and user-defined presets
    List,
    /// Show a preset's prompt templates
    Show {
        /// Preset name
        name: String,
    },
    /// Show the active default preset
    Which,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Print one value (dotted key, e.g. defaults.to)
    Get { key: String },
    /// Set one value; booleans and numbers are stored as such
    Set { key: String, value: String },
    /// Remove one value
    Unset { key: String },
}
