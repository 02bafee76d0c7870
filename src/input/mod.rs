//! Where the text to translate comes from.

use std::path::PathBuf;

mod format;
mod inspect;
mod reader;
mod resolver;

pub use format::{FormatHint, ResolvedFormat, detect_format};
pub use inspect::{Inspection, inspect};
pub use reader::read_stdin;
pub use resolver::{expand_glob, looks_like_glob, resolve_input};

/// One input file. Ordered by path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResolvedInputFile {
    pub path: PathBuf,
    /// Whether the file came from a glob rather than an explicit argument.
    pub matched_by_glob: bool,
}

impl ResolvedInputFile {
    pub const fn new(path: PathBuf, matched_by_glob: bool) -> Self {
        Self {
            path,
            matched_by_glob,
        }
    }

    /// The file name, for messages.
    pub fn display_name(&self) -> String {
        self.path.file_name().map_or_else(
            || self.path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        )
    }

    /// Whether this is an Xcode string catalog.
    pub fn is_catalog(&self) -> bool {
        self.path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xcstrings"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    InlineText(String),
    Stdin(String),
    Files {
        files: Vec<ResolvedInputFile>,
        came_from_glob: bool,
    },
}

impl InputMode {
    pub const fn is_files(&self) -> bool {
        matches!(self, Self::Files { .. })
    }
}
