//! Language normalization: raw user input to a canonical code and display name.
//!
//! Accepted forms, checked in order:
//! 1. `auto` (source language only)
//! 2. ISO 639-2 three-letter codes (`fra`, `deu`, ...)
//! 3. English language names (`French`, `traditional chinese`, ...)
//! 4. ISO 639-1 codes (`fr`, `ja`, ...)
//! 5. BCP 47 tags with a two-letter primary subtag (`zh-TW`, `pt-BR`, ...)

use crate::error::AppError;
use crate::ui::Style;

/// Display name used for `{from}` when the source language is auto-detected.
pub const SOURCE_LANGUAGE_PLACEHOLDER: &str = "the source language";

/// Known language codes (ISO 639-1) and their English names.
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("af", "Afrikaans"),
    ("am", "Amharic"),
    ("ar", "Arabic"),
    ("az", "Azerbaijani"),
    ("be", "Belarusian"),
    ("bg", "Bulgarian"),
    ("bn", "Bangla"),
    ("bs", "Bosnian"),
    ("ca", "Catalan"),
    ("cs", "Czech"),
    ("cy", "Welsh"),
    ("da", "Danish"),
    ("de", "German"),
    ("el", "Greek"),
    ("en", "English"),
    ("es", "Spanish"),
    ("et", "Estonian"),
    ("eu", "Basque"),
    ("fa", "Persian"),
    ("fi", "Finnish"),
    ("fr", "French"),
    ("ga", "Irish"),
    ("gl", "Galician"),
    ("gu", "Gujarati"),
    ("he", "Hebrew"),
    ("hi", "Hindi"),
    ("hr", "Croatian"),
    ("hu", "Hungarian"),
    ("hy", "Armenian"),
    ("id", "Indonesian"),
    ("is", "Icelandic"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("ka", "Georgian"),
    ("kk", "Kazakh"),
    ("km", "Khmer"),
    ("kn", "Kannada"),
    ("ko", "Korean"),
    ("la", "Latin"),
    ("lo", "Lao"),
    ("lt", "Lithuanian"),
    ("lv", "Latvian"),
    ("mk", "Macedonian"),
    ("ml", "Malayalam"),
    ("mn", "Mongolian"),
    ("mr", "Marathi"),
    ("ms", "Malay"),
    ("mt", "Maltese"),
    ("my", "Burmese"),
    ("nb", "Norwegian Bokmål"),
    ("ne", "Nepali"),
    ("nl", "Dutch"),
    ("no", "Norwegian"),
    ("pa", "Punjabi"),
    ("pl", "Polish"),
    ("ps", "Pashto"),
    ("pt", "Portuguese"),
    ("ro", "Romanian"),
    ("ru", "Russian"),
    ("si", "Sinhala"),
    ("sk", "Slovak"),
    ("sl", "Slovenian"),
    ("sq", "Albanian"),
    ("sr", "Serbian"),
    ("sv", "Swedish"),
    ("sw", "Swahili"),
    ("ta", "Tamil"),
    ("te", "Telugu"),
    ("th", "Thai"),
    ("tl", "Tagalog"),
    ("tr", "Turkish"),
    ("uk", "Ukrainian"),
    ("ur", "Urdu"),
    ("uz", "Uzbek"),
    ("vi", "Vietnamese"),
    ("zh", "Chinese"),
];

const ISO_639_2_TO_1: &[(&str, &str)] = &[
    ("fra", "fr"),
    ("fre", "fr"),
    ("deu", "de"),
    ("ger", "de"),
    ("spa", "es"),
    ("ita", "it"),
    ("por", "pt"),
    ("zho", "zh"),
    ("chi", "zh"),
    ("jpn", "ja"),
    ("kor", "ko"),
    ("rus", "ru"),
    ("tur", "tr"),
    ("nld", "nl"),
    ("dut", "nl"),
    ("pol", "pl"),
    ("ukr", "uk"),
    ("ron", "ro"),
    ("rum", "ro"),
    ("ces", "cs"),
    ("cze", "cs"),
    ("ara", "ar"),
    ("hin", "hi"),
    ("swe", "sv"),
    ("dan", "da"),
    ("fin", "fi"),
    ("nor", "no"),
    ("ell", "el"),
    ("gre", "el"),
    ("heb", "he"),
];

/// Names that resolve to a regional tag rather than a bare language code.
const REGIONAL_NAMES: &[(&str, &str, &str)] = &[
    ("chinese (traditional)", "zh-tw", "Traditional Chinese"),
    ("traditional chinese", "zh-tw", "Traditional Chinese"),
    ("chinese (simplified)", "zh-cn", "Simplified Chinese"),
    ("simplified chinese", "zh-cn", "Simplified Chinese"),
];

const AUTO_TO_MESSAGE: &str =
    "'auto' is not valid for --to. A specific target language is required. Example: --to fr";

/// A language after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedLanguage {
    /// The raw value the user typed (trimmed).
    pub input: String,
    /// English display name used in prompts.
    pub display_name: String,
    /// Code handed to providers (`auto`, `fr`, `zh-tw`, ...).
    pub provider_code: String,
    pub is_auto: bool,
}

impl NormalizedLanguage {
    /// Uppercased primary subtag, used for default output suffixes (`_FR`).
    pub fn output_suffix_code(&self) -> String {
        self.provider_code
            .split('-')
            .next()
            .unwrap_or(&self.provider_code)
            .to_uppercase()
    }

    /// The `{from}` rendering: the display name, or a neutral phrase for `auto`.
    pub fn prompt_name(&self) -> &str {
        if self.is_auto {
            SOURCE_LANGUAGE_PLACEHOLDER
        } else {
            &self.display_name
        }
    }

    /// Builds a language from a catalog code without validation.
    pub fn from_code(code: &str) -> Self {
        let lowered = code.trim().to_lowercase();
        let display_name = lookup(&lowered).map_or_else(|| code.to_string(), |l| l.display_name);
        Self {
            input: code.to_string(),
            display_name,
            provider_code: code.to_string(),
            is_auto: false,
        }
    }
}

/// Normalizes a `--from` value. `auto` is accepted.
pub fn normalize_from(raw: &str) -> Result<NormalizedLanguage, AppError> {
    normalize(raw, true)
}

/// Normalizes a `--to` value. `auto` is rejected.
pub fn normalize_to(raw: &str) -> Result<NormalizedLanguage, AppError> {
    normalize(raw, false)
}

fn normalize(raw_value: &str, allow_auto: bool) -> Result<NormalizedLanguage, AppError> {
    let raw = raw_value.trim();
    let lowered = raw.to_lowercase();

    if lowered == "auto" {
        if !allow_auto {
            return Err(AppError::invalid_arguments(AUTO_TO_MESSAGE));
        }
        return Ok(NormalizedLanguage {
            input: raw.to_string(),
            display_name: SOURCE_LANGUAGE_PLACEHOLDER.to_string(),
            provider_code: "auto".to_string(),
            is_auto: true,
        });
    }

    lookup(&lowered)
        .map(|mut language| {
            language.input = raw.to_string();
            language
        })
        .ok_or_else(|| {
            AppError::invalid_arguments(format!(
                "'{raw_value}' is not a recognized language. Use a language name (e.g. 'French'), \
                 ISO 639-1 code (e.g. 'fr'), or BCP 47 tag (e.g. 'zh-TW')."
            ))
        })
}

fn lookup(lowered: &str) -> Option<NormalizedLanguage> {
    if let Some((_, code)) = ISO_639_2_TO_1.iter().find(|(alias, _)| *alias == lowered) {
        return from_language_code(code);
    }

    if let Some((_, code, name)) = REGIONAL_NAMES.iter().find(|(n, _, _)| *n == lowered) {
        return Some(language(code, name));
    }

    if let Some((code, _)) = SUPPORTED_LANGUAGES
        .iter()
        .find(|(_, name)| name.to_lowercase() == lowered)
    {
        return from_language_code(code);
    }

    if let Some(language) = from_language_code(lowered) {
        return Some(language);
    }

    from_bcp47(lowered)
}

fn from_language_code(code: &str) -> Option<NormalizedLanguage> {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(code, name)| language(code, name))
}

fn from_bcp47(lowered: &str) -> Option<NormalizedLanguage> {
    let (primary, region) = lowered.split_once(['-', '_'])?;
    if primary.len() != 2 || region.is_empty() {
        return None;
    }
    let tag = format!("{primary}-{region}");

    let display_name = match tag.as_str() {
        t if t.starts_with("zh-tw") || t.starts_with("zh-hant") || t.starts_with("zh-hk") => {
            "Traditional Chinese".to_string()
        }
        t if t.starts_with("zh-cn") || t.starts_with("zh-hans") || t.starts_with("zh-sg") => {
            "Simplified Chinese".to_string()
        }
        _ => {
            let (_, base) = SUPPORTED_LANGUAGES.iter().find(|(c, _)| *c == primary)?;
            format!("{base} ({})", region.to_uppercase())
        }
    };

    Some(language(&tag, &display_name))
}

fn language(code: &str, name: &str) -> NormalizedLanguage {
    NormalizedLanguage {
        input: code.to_string(),
        display_name: name.to_string(),
        provider_code: code.to_string(),
        is_auto: false,
    }
}

/// Prints all known language codes to stdout.
pub fn print_languages() {
    println!("{}", Style::header("Supported language codes (ISO 639-1)"));
    for (code, name) in SUPPORTED_LANGUAGES {
        println!("  {:5} {}", Style::code(code), Style::secondary(name));
    }
    println!();
    println!(
        "{}",
        Style::secondary("Language names (e.g. 'French') and BCP 47 tags (e.g. 'zh-TW') are also accepted.")
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_is_valid_source() {
        let lang = normalize_from(" auto ").unwrap();
        assert!(lang.is_auto);
        assert_eq!(lang.provider_code, "auto");
        assert_eq!(lang.display_name, SOURCE_LANGUAGE_PLACEHOLDER);
    }

    #[test]
    fn test_auto_is_rejected_as_target() {
        let err = normalize_to("AUTO").unwrap_err();
        assert_eq!(err.message, AUTO_TO_MESSAGE);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_iso_639_1_code() {
        let lang = normalize_to("fr").unwrap();
        assert_eq!(lang.provider_code, "fr");
        assert_eq!(lang.display_name, "French");
        assert!(!lang.is_auto);
    }

    #[test]
    fn test_iso_639_2_code() {
        let lang = normalize_to("deu").unwrap();
        assert_eq!(lang.provider_code, "de");
        assert_eq!(lang.display_name, "German");
        assert_eq!(lang.input, "deu");
    }

    #[test]
    fn test_english_name_case_insensitive() {
        let lang = normalize_to("JAPANESE").unwrap();
        assert_eq!(lang.provider_code, "ja");
    }

    #[test]
    fn test_regional_chinese_names() {
        let lang = normalize_to("Traditional Chinese").unwrap();
        assert_eq!(lang.provider_code, "zh-tw");
        assert_eq!(lang.display_name, "Traditional Chinese");
    }

    #[test]
    fn test_bcp47_tags() {
        let tw = normalize_to("zh-TW").unwrap();
        assert_eq!(tw.provider_code, "zh-tw");
        assert_eq!(tw.display_name, "Traditional Chinese");

        let cn = normalize_to("zh-CN").unwrap();
        assert_eq!(cn.display_name, "Simplified Chinese");

        let br = normalize_to("pt-BR").unwrap();
        assert_eq!(br.provider_code, "pt-br");
        assert_eq!(br.display_name, "Portuguese (BR)");
    }

    #[test]
    fn test_unknown_language() {
        let err = normalize_to("klingon").unwrap_err();
        assert!(err.message.contains("'klingon' is not a recognized language"));
    }

    #[test]
    fn test_output_suffix_code() {
        assert_eq!(normalize_to("fr").unwrap().output_suffix_code(), "FR");
        assert_eq!(normalize_to("zh-TW").unwrap().output_suffix_code(), "ZH");
    }

    #[test]
    fn test_prompt_name() {
        assert_eq!(normalize_from("auto").unwrap().prompt_name(), "the source language");
        assert_eq!(normalize_from("es").unwrap().prompt_name(), "Spanish");
    }
}
