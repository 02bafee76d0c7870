//! `translate presets`.

use anyhow::Result;

use crate::config::ResolvedConfig;
use crate::output::Terminal;
use crate::translation::{list_presets, resolve_preset};

/// Prints built-in and user-defined presets, marking the active default.
pub fn list(terminal: &dyn Terminal, config: &ResolvedConfig) -> Result<()> {
    let listing = list_presets(&config.presets);
    let active = config.defaults.preset.as_str();

    terminal.print_line("BUILT-IN PRESETS")?;
    for preset in &listing.built_in {
        let marker = if preset.name == active { "*" } else { " " };
        terminal.print_line(&format!(
            "  {:14}{marker}  {}",
            preset.name,
            preset.description.as_deref().unwrap_or_default()
        ))?;
    }

    terminal.print_line("")?;
    terminal.print_line(&format!("USER-DEFINED PRESETS (in {})", config.path.display()))?;
    for preset in &listing.user {
        let marker = if preset.name == active { "*" } else { " " };
        terminal.print_line(&format!(
            "  {:14}{marker}  {}",
            preset.name,
            preset.description.as_deref().unwrap_or("Custom preset")
        ))?;
    }

    terminal.print_line("")?;
    terminal.print_line("  * = active default")?;
    Ok(())
}

/// Prints a preset's templates.
pub fn show(terminal: &dyn Terminal, config: &ResolvedConfig, name: &str) -> Result<()> {
    let preset = resolve_preset(name, &config.presets)?;

    terminal.print_line("--- SYSTEM PROMPT ---")?;
    terminal.print_line(&template_text(preset.system_prompt.as_deref(), preset.system_prompt_file.as_deref()))?;
    terminal.print_line("")?;
    terminal.print_line("--- USER PROMPT ---")?;
    terminal.print_line(&template_text(preset.user_prompt.as_deref(), preset.user_prompt_file.as_deref()))?;
    Ok(())
}

fn template_text(inline: Option<&str>, file: Option<&str>) -> String {
    match (inline, file) {
        (Some(text), _) => text.to_string(),
        (None, Some(path)) => format!("(from file {path})"),
        (None, None) => String::new(),
    }
}

/// Prints the active default preset and where it comes from.
pub fn which(terminal: &dyn Terminal, config: &ResolvedConfig) -> Result<()> {
    let preset = resolve_preset(&config.defaults.preset, &config.presets)?;
    terminal.print_line(&format!("{} ({})", preset.name, preset.source))?;
    Ok(())
}
