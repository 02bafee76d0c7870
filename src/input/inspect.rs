//! Pre-flight checks on an input file before it is translated.

use std::fs;

use super::ResolvedInputFile;

const SAMPLE_SIZE: usize = 8192;
const CONTROL_RATIO_LIMIT: f64 = 0.15;

/// What reading a file produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inspection {
    Text(String),
    /// Blank file; skipped with this warning.
    Skipped(String),
    Failed(String),
}

pub fn inspect(file: &ResolvedInputFile) -> Inspection {
    let name = file.display_name();
    let Ok(data) = fs::read(&file.path) else {
        return Inspection::Failed(format!("Input file '{}' not found.", file.path.display()));
    };

    if appears_binary(&data) {
        return Inspection::Failed(format!(
            "'{name}' appears to be a binary file and cannot be translated."
        ));
    }

    let Ok(text) = String::from_utf8(data) else {
        return Inspection::Failed(format!(
            "'{name}' contains invalid UTF-8. Please re-encode the file as UTF-8 before translating."
        ));
    };

    if text.trim().is_empty() {
        return Inspection::Skipped(format!("'{name}' is empty. Skipping."));
    }
    Inspection::Text(text)
}

/// A NUL byte or too many control bytes in the first 8 KiB.
fn appears_binary(data: &[u8]) -> bool {
    if data.is_empty() {
        return false;
    }
    let sample = &data[..data.len().min(SAMPLE_SIZE)];
    if sample.contains(&0) {
        return true;
    }
    let control = sample
        .iter()
        .filter(|&&b| b < 7 || (b > 13 && b < 32))
        .count();
    control as f64 / sample.len() as f64 > CONTROL_RATIO_LIMIT
}
