use anyhow::Result;
use clap::Parser;

use translate_cli::cli::commands::{config, presets, translate};
use translate_cli::cli::{Args, Command, ConfigCommand, PresetsCommand};
use translate_cli::config::ConfigManager;
use translate_cli::error::{exit_code_for, user_message};
use translate_cli::output::{ConsoleTerminal, OutputConfig, Terminal, init_tracing};
use translate_cli::paths::resolve_config_path;
use translate_cli::translation::print_languages;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.global.verbose);

    let terminal = ConsoleTerminal::new(OutputConfig {
        quiet: args.global.quiet,
        verbose: args.global.verbose,
        ..OutputConfig::default()
    });

    if let Err(err) = run(args, &terminal).await {
        terminal.error(&user_message(&err));
        std::process::exit(exit_code_for(&err));
    }
}

async fn run(mut args: Args, terminal: &ConsoleTerminal) -> Result<()> {
    let config_flag = args.global.config.take();
    let manager = || ConfigManager::new(resolve_config_path(config_flag.as_deref()));

    match args.command.take() {
        Some(Command::Languages) => print_languages(),
        Some(Command::Presets { command }) => {
            let resolved = manager().resolve()?;
            match command {
                PresetsCommand::List => presets::list(terminal, &resolved)?,
                PresetsCommand::Show { name } => presets::show(terminal, &resolved, &name)?,
                PresetsCommand::Which => presets::which(terminal, &resolved)?,
            }
        }
        Some(Command::Config { command }) => {
            let manager = manager();
            match command {
                ConfigCommand::Show => config::show(terminal, &manager)?,
                ConfigCommand::Path => config::path(terminal, &manager)?,
                ConfigCommand::Get { key } => config::get(terminal, &manager, &key)?,
                ConfigCommand::Set { key, value } => config::set(&manager, &key, &value)?,
                ConfigCommand::Unset { key } => config::unset(&manager, &key)?,
            }
        }
        None => {
            translate::run_translate(terminal, config_flag.as_deref(), args.into()).await?;
        }
    }

    Ok(())
}
