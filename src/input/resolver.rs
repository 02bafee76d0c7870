//! Positional arguments to an [`InputMode`].

use anyhow::Result;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use super::{InputMode, ResolvedInputFile};
use crate::error::AppError;

const EMPTY_INPUT: &str = "Error: Input text is empty.";

pub fn looks_like_glob(arg: &str) -> bool {
    arg.contains(['*', '?', '['])
}

/// Resolves positional arguments.
///
/// `read_stdin` is only called when there are no arguments and stdin is not
/// a terminal.
pub fn resolve_input(
    positional: &[String],
    force_text: bool,
    stdin_is_tty: bool,
    cwd: &Path,
    read_stdin: impl FnOnce() -> Result<String>,
) -> Result<InputMode> {
    if force_text {
        let [text] = positional else {
            return Err(AppError::invalid_arguments(
                "--text requires exactly one positional argument.",
            )
            .into());
        };
        if text.is_empty() {
            return Err(AppError::runtime(EMPTY_INPUT).into());
        }
        return Ok(InputMode::InlineText(text.clone()));
    }

    match positional {
        [] => {
            if stdin_is_tty {
                return Err(AppError::invalid_arguments(
                    "No input provided. Provide text, file path(s), or pipe stdin.",
                )
                .into());
            }
            let text = read_stdin()?;
            if text.trim().is_empty() {
                return Err(AppError::runtime(EMPTY_INPUT).into());
            }
            Ok(InputMode::Stdin(text))
        }
        [candidate] => {
            if looks_like_glob(candidate) {
                let files = expand_glob(candidate, cwd)?;
                return Ok(InputMode::Files {
                    files: files.into_iter().map(|p| ResolvedInputFile::new(p, true)).collect(),
                    came_from_glob: true,
                });
            }

            let path = absolute(candidate, cwd);
            if path.is_file() {
                return Ok(InputMode::Files {
                    files: vec![ResolvedInputFile::new(path, false)],
                    came_from_glob: false,
                });
            }

            if candidate.is_empty() {
                return Err(AppError::runtime(EMPTY_INPUT).into());
            }
            Ok(InputMode::InlineText(candidate.clone()))
        }
        many => {
            let mut files = BTreeSet::new();
            let mut saw_glob = false;

            for arg in many {
                if looks_like_glob(arg) {
                    saw_glob = true;
                    files.extend(expand_glob(arg, cwd)?.into_iter().map(|p| ResolvedInputFile::new(p, true)));
                    continue;
                }

                let path = absolute(arg, cwd);
                if !path.is_file() {
                    return Err(AppError::invalid_arguments(format!(
                        "Argument '{arg}' is not a valid file path. To translate a literal string, use --text."
                    ))
                    .into());
                }
                files.insert(ResolvedInputFile::new(path, false));
            }

            let mut deduped: Vec<ResolvedInputFile> = Vec::with_capacity(files.len());
            for file in files {
                if deduped.last().is_none_or(|last| last.path != file.path) {
                    deduped.push(file);
                }
            }

            if deduped.is_empty() {
                return Err(AppError::runtime(EMPTY_INPUT).into());
            }
            Ok(InputMode::Files {
                files: deduped,
                came_from_glob: saw_glob,
            })
        }
    }
}

/// Expands `pattern` relative to `cwd`, keeping regular files only.
pub fn expand_glob(pattern: &str, cwd: &Path) -> Result<Vec<PathBuf>> {
    let full = if Path::new(pattern).is_absolute() {
        pattern.to_string()
    } else {
        cwd.join(pattern).to_string_lossy().into_owned()
    };

    let paths = glob::glob(&full).map_err(|e| {
        AppError::invalid_arguments(format!("Invalid glob pattern '{pattern}': {}", e.msg))
    })?;

    let matched: BTreeSet<PathBuf> = paths
        .filter_map(std::result::Result::ok)
        .filter(|p| p.is_file())
        .map(|p| normalize(&p))
        .collect();

    if matched.is_empty() {
        return Err(AppError::runtime(format!("No files matched the pattern '{pattern}'.")).into());
    }
    tracing::debug!(pattern, count = matched.len(), "glob expanded");
    Ok(matched.into_iter().collect())
}

fn absolute(raw: &str, cwd: &Path) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&cwd.join(path))
    }
}

/// Lexically removes `.` and resolves `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
