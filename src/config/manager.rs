use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::{ConfigFile, ResolvedConfig};
use crate::error::AppError;
use crate::fs::atomic_write;

/// Manages loading and saving the configuration file.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Reads the raw table. A missing file is an empty table.
    pub fn load_table(&self) -> Result<toml::Table> {
        if !self.config_path.exists() {
            return Ok(toml::Table::new());
        }

        let contents = fs::read_to_string(&self.config_path).with_context(|| {
            format!("Failed to read config file: {}", self.config_path.display())
        })?;

        contents.parse::<toml::Table>().map_err(|e| {
            AppError::runtime(format!(
                "Error: Failed to parse config file '{}': {}",
                self.config_path.display(),
                e.message()
            ))
            .into()
        })
    }

    /// Reads the file and its typed view.
    pub fn load(&self) -> Result<(toml::Table, ConfigFile)> {
        let table = self.load_table()?;
        let file = ConfigFile::from_table(&table).map_err(|e| {
            AppError::runtime(format!(
                "Error: Failed to parse config file '{}': {}",
                self.config_path.display(),
                e.message()
            ))
        })?;
        Ok((table, file))
    }

    /// Loads and resolves the file against built-in defaults.
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        let (table, file) = self.load()?;
        Ok(ResolvedConfig::new(self.config_path.clone(), table, file))
    }

    pub fn save_table(&self, table: &toml::Table) -> Result<()> {
        let contents = toml::to_string_pretty(table).context("Failed to serialize config")?;
        atomic_write(&self.config_path, &contents)?;
        tracing::debug!(path = %self.config_path.display(), "config saved");
        Ok(())
    }
}
