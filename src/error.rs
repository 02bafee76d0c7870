//! Application error kinds and their process exit codes.
//!
//! Command handlers return `anyhow::Result`; anything that must map to a
//! specific exit status is raised as an [`AppError`] and recovered in `main`
//! with `downcast_ref`.

use thiserror::Error;

use crate::provider::ProviderError;

/// Exit status for runtime failures (network, I/O, provider errors).
pub const EXIT_RUNTIME: exitcode::ExitCode = 1;
/// Exit status for invalid or conflicting arguments.
pub const EXIT_INVALID_ARGUMENTS: exitcode::ExitCode = 2;
/// Exit status when the user declined a confirmation.
pub const EXIT_ABORTED: exitcode::ExitCode = 3;

/// Category of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Runtime,
    InvalidArguments,
    Aborted,
}

impl ErrorKind {
    pub const fn exit_code(self) -> exitcode::ExitCode {
        match self {
            Self::Runtime => EXIT_RUNTIME,
            Self::InvalidArguments => EXIT_INVALID_ARGUMENTS,
            Self::Aborted => EXIT_ABORTED,
        }
    }
}

/// A user-facing error carrying the exit code it should produce.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AppError {
    pub fn runtime(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Runtime,
            message: message.into(),
        }
    }

    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InvalidArguments,
            message: message.into(),
        }
    }

    pub fn aborted(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Aborted,
            message: message.into(),
        }
    }

    pub const fn exit_code(&self) -> exitcode::ExitCode {
        self.kind.exit_code()
    }
}

/// Picks the exit code for an error bubbling out of a command handler.
pub fn exit_code_for(err: &anyhow::Error) -> exitcode::ExitCode {
    err.downcast_ref::<AppError>()
        .map_or(EXIT_RUNTIME, AppError::exit_code)
}

/// The text printed for an error bubbling out of a command handler.
///
/// Application and provider errors already carry their user-facing wording;
/// anything else is prefixed and shown with its context chain.
pub fn user_message(err: &anyhow::Error) -> String {
    if err.downcast_ref::<AppError>().is_some() || err.downcast_ref::<ProviderError>().is_some() {
        err.to_string()
    } else {
        format!("Error: {err:#}")
    }
}
