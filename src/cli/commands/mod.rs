//! Subcommand implementations.

/// `translate config` handlers.
pub mod config;

/// `translate presets` handlers.
pub mod presets;

/// The default translate command.
pub mod translate;
