use clap::ValueEnum;
use std::path::Path;

/// Requested input format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum FormatHint {
    #[default]
    Auto,
    Text,
    Markdown,
    Html,
}

impl FormatHint {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "text" => Some(Self::Text),
            "markdown" => Some(Self::Markdown),
            "html" => Some(Self::Html),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Text => "text",
            Self::Markdown => "markdown",
            Self::Html => "html",
        }
    }
}

/// The format actually used for a given input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedFormat {
    Text,
    Markdown,
    Html,
}

impl ResolvedFormat {
    /// The `{format}` placeholder value.
    pub const fn prompt_value(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Markdown => "markdown",
            Self::Html => "HTML",
        }
    }
}

/// Resolves `auto` from the file extension; non-file input is text.
pub fn detect_format(hint: FormatHint, file: Option<&Path>) -> ResolvedFormat {
    match hint {
        FormatHint::Text => ResolvedFormat::Text,
        FormatHint::Markdown => ResolvedFormat::Markdown,
        FormatHint::Html => ResolvedFormat::Html,
        FormatHint::Auto => {
            let ext = file
                .and_then(Path::extension)
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            match ext.as_str() {
                "md" | "markdown" | "mdx" => ResolvedFormat::Markdown,
                "html" | "htm" => ResolvedFormat::Html,
                _ => ResolvedFormat::Text,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_hint_wins() {
        assert_eq!(
            detect_format(FormatHint::Html, Some(Path::new("notes.md"))),
            ResolvedFormat::Html
        );
    }

    #[test]
    fn test_auto_uses_extension() {
        assert_eq!(
            detect_format(FormatHint::Auto, Some(Path::new("README.MD"))),
            ResolvedFormat::Markdown
        );
        assert_eq!(
            detect_format(FormatHint::Auto, Some(Path::new("page.htm"))),
            ResolvedFormat::Html
        );
        assert_eq!(
            detect_format(FormatHint::Auto, Some(Path::new("notes.txt"))),
            ResolvedFormat::Text
        );
        assert_eq!(detect_format(FormatHint::Auto, None), ResolvedFormat::Text);
    }

    #[test]
    fn test_parse_and_prompt_value() {
        assert_eq!(FormatHint::parse(" Markdown "), Some(FormatHint::Markdown));
        assert_eq!(FormatHint::parse("pdf"), None);
        assert_eq!(ResolvedFormat::Html.prompt_value(), "HTML");
    }
}
