use anyhow::Result;
use inquire::{Confirm, InquireError};

mod spinner;
mod style;

pub use spinner::Spinner;
pub use style::Style;

/// Asks a yes/no question on the terminal, defaulting to "no".
///
/// Ctrl+C and Escape count as "no".
pub fn ask_yes_no(prompt: &str) -> Result<bool> {
    declined_on_cancel(Confirm::new(prompt).with_default(false).prompt())
}

fn declined_on_cancel(answer: Result<bool, InquireError>) -> Result<bool> {
    match answer {
        Ok(answer) => Ok(answer),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(false),
        Err(e) => Err(e.into()),
    }
}
