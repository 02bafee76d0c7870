//! `translate config`: inspect and edit the config file by dotted key.

use anyhow::{Context, Result};

use crate::config::{
    ConfigManager, effective_table, get_value, parse_scalar, set_value, to_printable, unset_value,
};
use crate::error::AppError;
use crate::output::Terminal;

/// Prints the effective configuration as TOML.
pub fn show(terminal: &dyn Terminal, manager: &ConfigManager) -> Result<()> {
    let config = manager.resolve()?;
    let rendered =
        toml::to_string_pretty(&effective_table(&config)).context("Failed to serialize config")?;
    terminal.write_stdout(&rendered)?;
    Ok(())
}

pub fn path(terminal: &dyn Terminal, manager: &ConfigManager) -> Result<()> {
    terminal.print_line(&manager.config_path().display().to_string())?;
    Ok(())
}

pub fn get(terminal: &dyn Terminal, manager: &ConfigManager, key: &str) -> Result<()> {
    let table = manager.load_table()?;
    let value = get_value(&table, key)
        .ok_or_else(|| AppError::runtime(format!("Error: Key '{key}' not found.")))?;
    terminal.print_line(&to_printable(value))?;
    Ok(())
}

pub fn set(manager: &ConfigManager, key: &str, value: &str) -> Result<()> {
    let mut table = manager.load_table()?;
    set_value(&mut table, key, parse_scalar(value));
    manager.save_table(&table)
}

/// Removing a missing key is not an error.
pub fn unset(manager: &ConfigManager, key: &str) -> Result<()> {
    let mut table = manager.load_table()?;
    if !unset_value(&mut table, key) {
        tracing::debug!(key, "config key was not set");
    }
    manager.save_table(&table)
}
