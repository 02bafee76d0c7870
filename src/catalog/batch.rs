//! Best-effort translation of every segment in a catalog.

use std::fs;

use super::{CatalogSegment, StringCatalog};
use crate::execution::{OutputMode, OutputWriter, Scheduler, TranslationFileResult};
use crate::input::{ResolvedFormat, ResolvedInputFile};
use crate::provider::{NetworkConfig, ProviderRequest};
use crate::translation::{NormalizedLanguage, PromptContext, ResolvedPromptSet};

/// A segment that could not be translated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentFailure {
    pub key: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub translated: usize,
    pub failures: Vec<SegmentFailure>,
}

impl BatchReport {
    /// `None` when every segment succeeded.
    pub fn failure_summary(&self) -> Option<String> {
        let first = self.failures.first()?;
        Some(format!(
            "{} segment(s) failed in catalog translation. First failure: {}",
            self.failures.len(),
            first.reason
        ))
    }
}

#[derive(Debug, Clone)]
pub struct CatalogTranslation {
    pub catalog: StringCatalog,
    pub report: BatchReport,
}

/// Translates catalog segments through a [`Scheduler`].
#[derive(Debug, Clone)]
pub struct BatchTranslator {
    scheduler: Scheduler,
    /// Unrendered templates; `None` for promptless backends.
    prompts: Option<ResolvedPromptSet>,
    network: NetworkConfig,
}

impl BatchTranslator {
    pub const fn new(scheduler: Scheduler, prompts: Option<ResolvedPromptSet>, network: NetworkConfig) -> Self {
        Self {
            scheduler,
            prompts,
            network,
        }
    }

    /// Translates every pending segment into `to`.
    ///
    /// Failed segments are recorded in the report and left untouched in the
    /// catalog; they never abort the rest.
    pub async fn translate(
        &self,
        mut catalog: StringCatalog,
        to: &NormalizedLanguage,
        filename: &str,
    ) -> CatalogTranslation {
        let from = NormalizedLanguage::from_code(&catalog.source_language);
        let segments = catalog.segments(&to.provider_code);
        let requests = segments
            .iter()
            .map(|segment| self.request(segment, &from, to, filename))
            .collect();

        let outcomes = self.scheduler.run(requests).await;

        let mut report = BatchReport::default();
        for (segment, outcome) in segments.into_iter().zip(outcomes) {
            match outcome {
                Ok(translated) => {
                    catalog.set_translation(&segment.key, &to.provider_code, translated.text);
                    report.translated += 1;
                }
                Err(e) => {
                    tracing::debug!(key = %segment.key, error = %e, "catalog segment failed");
                    report.failures.push(SegmentFailure {
                        key: segment.key,
                        reason: e.to_string(),
                    });
                }
            }
        }

        CatalogTranslation { catalog, report }
    }

    fn request(
        &self,
        segment: &CatalogSegment,
        from: &NormalizedLanguage,
        to: &NormalizedLanguage,
        filename: &str,
    ) -> ProviderRequest {
        let rendered = self.prompts.as_ref().map(|templates| {
            templates.render(&PromptContext {
                text: &segment.text,
                from,
                to,
                context: segment.comment.as_deref().unwrap_or_default(),
                filename,
                format: ResolvedFormat::Text,
            })
        });

        ProviderRequest {
            from: from.clone(),
            to: to.clone(),
            system_prompt: rendered.as_ref().and_then(ResolvedPromptSet::system),
            user_prompt: rendered.as_ref().and_then(ResolvedPromptSet::user),
            text: segment.text.clone(),
            timeout_seconds: self.network.timeout_seconds,
            network: self.network,
        }
    }
}

/// Reads, translates and writes one catalog file.
///
/// A catalog that cannot be read or parsed fails without output. Otherwise
/// the catalog is written even when some segments failed, and the result
/// carries the failure summary.
pub async fn translate_catalog_file(
    file: &ResolvedInputFile,
    to: &NormalizedLanguage,
    translator: &BatchTranslator,
    mode: &OutputMode,
    writer: &OutputWriter<'_>,
) -> TranslationFileResult {
    let source = match fs::read_to_string(&file.path) {
        Ok(source) => source,
        Err(e) => {
            return TranslationFileResult::failed(
                file.clone(),
                format!("Failed to read '{}': {e}", file.display_name()),
            );
        }
    };
    let catalog = match StringCatalog::parse(&source) {
        Ok(catalog) => catalog,
        Err(e) => {
            return TranslationFileResult::failed(
                file.clone(),
                format!("Failed to parse string catalog '{}': {e}", file.display_name()),
            );
        }
    };

    let translation = translator.translate(catalog, to, &file.display_name()).await;
    let encoded = match translation.catalog.to_pretty_json() {
        Ok(encoded) => encoded,
        Err(e) => return TranslationFileResult::failed(file.clone(), e.to_string()),
    };

    let destination = match writer.write(&encoded, mode, mode.destination_for(file)) {
        Ok(destination) => destination,
        Err(e) => return TranslationFileResult::failed(file.clone(), e.to_string()),
    };

    match translation.report.failure_summary() {
        None => TranslationFileResult::succeeded(file.clone(), destination),
        Some(summary) => TranslationFileResult {
            file: file.clone(),
            destination,
            success: false,
            error_message: Some(summary),
        },
    }
}
