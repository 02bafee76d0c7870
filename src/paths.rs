//! Config file location and user path expansion.
//!
//! Resolution order for the config file:
//! 1. `--config <path>`
//! 2. `$TRANSLATE_CONFIG`
//! 3. `$XDG_CONFIG_HOME/translate/config.toml`
//! 4. `~/.config/translate/config.toml`

use std::path::{Path, PathBuf};

/// Environment variable overriding the config file path.
pub const CONFIG_ENV: &str = "TRANSLATE_CONFIG";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Returns the configuration directory for translate.
pub fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME").map_or_else(
        |_| home_dir().join(".config").join("translate"),
        |xdg| PathBuf::from(xdg).join("translate"),
    )
}

/// Resolves the config file path from the CLI flag and environment.
pub fn resolve_config_path(cli: Option<&str>) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let explicit = cli
        .map(str::to_string)
        .or_else(|| std::env::var(CONFIG_ENV).ok().filter(|v| !v.trim().is_empty()));

    explicit.map_or_else(
        || config_dir().join(CONFIG_FILE_NAME),
        |raw| expand_path(&raw, &cwd, &home_dir()),
    )
}

/// Expands a leading `~` and makes relative paths absolute against `cwd`.
pub fn expand_path(raw: &str, cwd: &Path, home: &Path) -> PathBuf {
    let trimmed = raw.trim();
    if trimmed == "~" {
        return home.to_path_buf();
    }
    if let Some(rest) = trimmed.strip_prefix("~/") {
        return home.join(rest);
    }

    let path = Path::new(trimmed);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Returns the user's home directory, falling back to the working directory.
pub fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}
