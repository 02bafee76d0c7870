//! Xcode string catalogs (`.xcstrings`).
//!
//! Only the fields translation needs are modelled; everything else is kept in
//! `extra` maps and written back unchanged. Keys keep their document order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

mod batch;

pub use batch::{BatchReport, BatchTranslator, CatalogTranslation, SegmentFailure, translate_catalog_file};

pub const TRANSLATED_STATE: &str = "translated";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringCatalog {
    pub source_language: String,
    #[serde(default)]
    pub strings: IndexMap<String, CatalogEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_translate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub localizations: Option<BTreeMap<String, Localization>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Localization {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_unit: Option<StringUnit>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringUnit {
    pub state: String,
    pub value: String,
}

/// One string to translate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSegment {
    pub key: String,
    pub text: String,
    pub comment: Option<String>,
}

impl StringCatalog {
    pub fn parse(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Strings that still need a translation into `target`.
    ///
    /// Skips entries marked `shouldTranslate: false`, entries with an empty
    /// source and entries already translated for `target`.
    pub fn segments(&self, target: &str) -> Vec<CatalogSegment> {
        self.strings
            .iter()
            .filter(|(_, entry)| entry.should_translate != Some(false))
            .filter(|(_, entry)| !entry.is_translated(target))
            .filter_map(|(key, entry)| {
                let text = entry
                    .unit(&self.source_language)
                    .map_or(key.as_str(), |unit| unit.value.as_str());
                (!text.trim().is_empty()).then(|| CatalogSegment {
                    key: key.clone(),
                    text: text.to_string(),
                    comment: entry.comment.clone(),
                })
            })
            .collect()
    }

    /// Records a translated value for `key`.
    pub fn set_translation(&mut self, key: &str, target: &str, value: String) {
        let Some(entry) = self.strings.get_mut(key) else {
            return;
        };
        let localization = entry
            .localizations
            .get_or_insert_with(BTreeMap::new)
            .entry(target.to_string())
            .or_default();
        localization.string_unit = Some(StringUnit {
            state: TRANSLATED_STATE.to_string(),
            value,
        });
    }
}

impl CatalogEntry {
    fn unit(&self, language: &str) -> Option<&StringUnit> {
        self.localizations
            .as_ref()?
            .get(language)?
            .string_unit
            .as_ref()
    }

    fn is_translated(&self, language: &str) -> bool {
        self.unit(language)
            .is_some_and(|unit| unit.state == TRANSLATED_STATE)
    }
}
