use anyhow::{Context, Result};
use std::io::{self, Read};

/// Reads all of stdin as UTF-8.
pub fn read_stdin() -> Result<String> {
    let mut buffer = Vec::new();
    io::stdin()
        .lock()
        .read_to_end(&mut buffer)
        .context("Failed to read from stdin")?;

    String::from_utf8(buffer).context("Input is not valid UTF-8")
}
