use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cli::args::Args;
use crate::config::ConfigManager;
use crate::execution::{InquireConfirmer, Runtime, TranslateOptions, run_translation};
use crate::input::read_stdin;
use crate::output::Terminal;
use crate::paths::{home_dir, resolve_config_path};
use crate::provider::HttpClient;

impl From<Args> for TranslateOptions {
    fn from(args: Args) -> Self {
        Self {
            input: args.input,
            text: args.text,
            output: args.output,
            in_place: args.in_place,
            suffix: args.suffix,
            stream: args.stream,
            yes: args.yes,
            jobs: args.jobs,
            from: args.from,
            to: args.to,
            provider: args.provider,
            model: args.model,
            base_url: args.base_url,
            api_key: args.api_key,
            preset: args.preset,
            system_prompt: args.system_prompt,
            user_prompt: args.user_prompt,
            context: args.context,
            no_lang: args.no_lang,
            format: args.format,
            dry_run: args.dry_run,
        }
    }
}

/// Runs the default command against the real process environment.
pub async fn run_translate(
    terminal: &dyn Terminal,
    config_path: Option<&str>,
    options: TranslateOptions,
) -> Result<()> {
    let config = ConfigManager::new(resolve_config_path(config_path)).resolve()?;
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let env: BTreeMap<String, String> = std::env::vars().collect();

    let runtime = Runtime {
        terminal,
        cwd,
        home: home_dir(),
        env,
        http: HttpClient::reqwest(&config.network),
        confirmer: Arc::new(InquireConfirmer),
        sessions: Vec::new(),
    };
    run_translation(runtime, config, options, read_stdin).await
}
