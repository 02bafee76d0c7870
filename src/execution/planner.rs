//! Decides where translated text goes.

use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::input::{InputMode, ResolvedInputFile};
use crate::translation::NormalizedLanguage;

pub const SUFFIX_ON_STDOUT_WARNING: &str =
    "--suffix has no effect when outputting to stdout. Use --output to write to a file.";

/// One source file and the file its translation is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub source: ResolvedInputFile,
    pub destination: PathBuf,
    pub in_place: bool,
}

/// Exactly one of these is active per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    Stdout,
    SingleFile(PathBuf),
    /// One target per input file, in input order.
    PerFile {
        targets: Vec<OutputTarget>,
        in_place: bool,
    },
}

impl OutputMode {
    pub const fn is_stdout(&self) -> bool {
        matches!(self, Self::Stdout)
    }

    pub const fn is_in_place(&self) -> bool {
        matches!(self, Self::PerFile { in_place: true, .. })
    }

    /// The planned destination for `file`, `None` for stdout.
    pub fn destination_for(&self, file: &ResolvedInputFile) -> Option<&Path> {
        match self {
            Self::Stdout => None,
            Self::SingleFile(path) => Some(path),
            Self::PerFile { targets, .. } => targets
                .iter()
                .find(|t| t.source.path == file.path)
                .map(|t| t.destination.as_path()),
        }
    }
}

/// Inputs to [`plan_output`].
#[derive(Debug, Clone, Copy)]
pub struct PlanRequest<'a> {
    pub input: &'a InputMode,
    pub to: &'a NormalizedLanguage,
    /// `--output`.
    pub output: Option<&'a str>,
    pub in_place: bool,
    pub suffix: Option<&'a str>,
    pub cwd: &'a Path,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPlan {
    pub mode: OutputMode,
    pub warnings: Vec<String>,
}

impl OutputPlan {
    fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            warnings: Vec::new(),
        }
    }
}

/// Turns inputs and output flags into one [`OutputMode`].
///
/// # Errors
///
/// Returns an invalid-arguments error when the flags conflict.
pub fn plan_output(request: &PlanRequest<'_>) -> Result<OutputPlan, AppError> {
    if request.in_place && request.output.is_some() {
        return Err(AppError::invalid_arguments(
            "--in-place and --output cannot be used together.",
        ));
    }
    if request.in_place && request.suffix.is_some() {
        return Err(AppError::invalid_arguments(
            "--in-place and --suffix cannot be used together. --in-place overwrites the original file; \
             --suffix creates a new file.",
        ));
    }

    let (files, came_from_glob) = match request.input {
        InputMode::InlineText(_) | InputMode::Stdin(_) => {
            if request.in_place {
                return Err(AppError::invalid_arguments("--in-place requires file input."));
            }
            let mode = request.output.map_or(OutputMode::Stdout, |path| {
                OutputMode::SingleFile(resolve_path(path, request.cwd))
            });
            return Ok(OutputPlan::new(mode));
        }
        InputMode::Files {
            files,
            came_from_glob,
        } => (files, *came_from_glob),
    };

    let any_glob = came_from_glob || files.iter().any(|f| f.matched_by_glob);
    if request.output.is_some() && (files.len() > 1 || any_glob) {
        return Err(AppError::invalid_arguments(
            "--output can only be used with a single input. Use --suffix for multiple files.",
        ));
    }

    if request.in_place {
        let targets = files
            .iter()
            .map(|file| OutputTarget {
                source: file.clone(),
                destination: file.path.clone(),
                in_place: true,
            })
            .collect();
        return Ok(OutputPlan::new(OutputMode::PerFile {
            targets,
            in_place: true,
        }));
    }

    if let Some(path) = request.output {
        return Ok(OutputPlan::new(OutputMode::SingleFile(resolve_path(
            path,
            request.cwd,
        ))));
    }

    if files.len() == 1 && !any_glob {
        let mut plan = OutputPlan::new(OutputMode::Stdout);
        if request.suffix.is_some() {
            plan.warnings.push(SUFFIX_ON_STDOUT_WARNING.to_string());
        }
        return Ok(plan);
    }

    let suffix = request
        .suffix
        .map_or_else(|| format!("_{}", request.to.output_suffix_code()), str::to_string);
    let targets = files
        .iter()
        .map(|file| {
            let name = file
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            OutputTarget {
                source: file.clone(),
                destination: file.path.with_file_name(apply_suffix(&name, &suffix)),
                in_place: false,
            }
        })
        .collect();

    Ok(OutputPlan::new(OutputMode::PerFile {
        targets,
        in_place: false,
    }))
}

/// Inserts `suffix` before the last extension: `a.md` + `.fr` is `a.fr.md`.
pub fn apply_suffix(file_name: &str, suffix: &str) -> String {
    match file_name.rfind('.') {
        Some(dot) => format!("{}{suffix}{}", &file_name[..dot], &file_name[dot..]),
        None => format!("{file_name}{suffix}"),
    }
}

fn resolve_path(raw: &str, cwd: &Path) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
