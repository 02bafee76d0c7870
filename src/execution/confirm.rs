use std::sync::Arc;

use anyhow::Result;

use crate::error::AppError;
use crate::ui::ask_yes_no;

pub const NOT_A_TTY_MESSAGE: &str = "Error: Interactive confirmation required but stdin is not a TTY. \
     Use --yes to confirm non-interactively.";
pub const ABORTED_MESSAGE: &str = "Aborted.";

/// Asks the user a yes/no question.
pub trait Confirmer: Send + Sync {
    fn ask(&self, prompt: &str) -> Result<bool>;
}

/// Interactive prompt on the terminal. Defaults to "no".
#[derive(Debug, Clone, Copy, Default)]
pub struct InquireConfirmer;

impl Confirmer for InquireConfirmer {
    fn ask(&self, prompt: &str) -> Result<bool> {
        ask_yes_no(prompt)
    }
}

/// Gate in front of anything that overwrites user files.
#[derive(Clone)]
pub struct ConfirmationPrompter {
    assume_yes: bool,
    stdin_is_tty: bool,
    confirmer: Arc<dyn Confirmer>,
}

impl ConfirmationPrompter {
    pub fn new(assume_yes: bool, stdin_is_tty: bool) -> Self {
        Self::with_confirmer(assume_yes, stdin_is_tty, Arc::new(InquireConfirmer))
    }

    pub fn with_confirmer(assume_yes: bool, stdin_is_tty: bool, confirmer: Arc<dyn Confirmer>) -> Self {
        Self {
            assume_yes,
            stdin_is_tty,
            confirmer,
        }
    }

    /// Succeeds when the user agrees or `--yes` is in effect.
    ///
    /// # Errors
    ///
    /// Returns an aborted error when the user declines or cannot be asked.
    pub fn confirm(&self, prompt: &str) -> Result<(), AppError> {
        if self.assume_yes {
            return Ok(());
        }
        if !self.stdin_is_tty {
            return Err(AppError::aborted(NOT_A_TTY_MESSAGE));
        }

        match self.confirmer.ask(prompt) {
            Ok(true) => Ok(()),
            Ok(false) => Err(AppError::aborted(ABORTED_MESSAGE)),
            Err(e) => {
                tracing::debug!(error = %e, "confirmation prompt failed");
                Err(AppError::aborted(ABORTED_MESSAGE))
            }
        }
    }
}

impl std::fmt::Debug for ConfirmationPrompter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmationPrompter")
            .field("assume_yes", &self.assume_yes)
            .field("stdin_is_tty", &self.stdin_is_tty)
            .finish_non_exhaustive()
    }
}
