//! Bounded-concurrency translation of many inputs.
//!
//! Each task is `pending -> in flight -> succeeded | failed`. The scheduler
//! never retries (the HTTP layer does) and one failure never cancels the
//! other tasks. Outcomes are stored by task index, so results and writes
//! follow input order, not completion order.

use std::sync::Arc;
use std::time::Instant;

use futures_util::StreamExt;
use futures_util::stream;

use super::planner::OutputMode;
use super::report::{Reporter, TranslationFileResult};
use super::writer::OutputWriter;
use crate::input::ResolvedInputFile;
use crate::output::Terminal;
use crate::provider::{ProviderError, ProviderRequest, TranslationProvider, Usage};
use crate::translation::strip_code_fence;

/// A finished translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translated {
    pub text: String,
    pub stripped_fence: bool,
    pub usage: Option<Usage>,
    pub elapsed_ms: u128,
    /// The text was already written to stdout chunk by chunk.
    pub streamed: bool,
}

fn stdout_error(err: std::io::Error) -> ProviderError {
    ProviderError::Output(err.to_string())
}

/// Translates one request.
///
/// With `stream_to` set and a streaming backend, chunks are written to stdout
/// as they arrive, followed by a newline if the text did not end with one.
/// Otherwise one `translate` call is made and a wrapping code fence removed.
///
/// # Errors
///
/// Returns the backend's error unchanged.
pub async fn translate_text(
    provider: &dyn TranslationProvider,
    request: &ProviderRequest,
    stream_to: Option<&dyn Terminal>,
) -> Result<Translated, ProviderError> {
    let started = Instant::now();

    if let Some(terminal) = stream_to
        && let Some(mut chunks) = provider.stream_translate(request)
    {
        let mut text = String::new();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            terminal.write_stdout(&chunk).map_err(stdout_error)?;
            text.push_str(&chunk);
        }
        if !text.ends_with('\n') {
            terminal.write_stdout("\n").map_err(stdout_error)?;
        }
        return Ok(Translated {
            text,
            stripped_fence: false,
            usage: None,
            elapsed_ms: started.elapsed().as_millis(),
            streamed: true,
        });
    }

    let result = provider.translate(request).await?;
    let (text, stripped_fence) = strip_code_fence(&result.text);
    Ok(Translated {
        text,
        stripped_fence,
        usage: result.usage,
        elapsed_ms: started.elapsed().as_millis(),
        streamed: false,
    })
}

/// One input file and its prepared request.
#[derive(Debug, Clone)]
pub struct FileTask {
    pub file: ResolvedInputFile,
    pub request: ProviderRequest,
}

/// Runs translation tasks with at most `jobs` in flight.
#[derive(Clone)]
pub struct Scheduler {
    provider: Arc<dyn TranslationProvider>,
    jobs: usize,
}

impl Scheduler {
    pub fn new(provider: Arc<dyn TranslationProvider>, jobs: usize) -> Self {
        Self { provider, jobs }
    }

    /// The in-flight bound for `task_count` tasks: `min(max(1, jobs), N)`.
    pub fn concurrency(&self, task_count: usize) -> usize {
        self.jobs.max(1).min(task_count.max(1))
    }

    /// Translates every request and returns one outcome per request, in order.
    pub async fn run(&self, requests: Vec<ProviderRequest>) -> Vec<Result<Translated, ProviderError>> {
        let total = requests.len();
        let limit = self.concurrency(total);
        let provider = self.provider.as_ref();
        tracing::debug!(total, limit, "scheduling translations");

        let mut outcomes: Vec<Option<Result<Translated, ProviderError>>> = (0..total).map(|_| None).collect();
        let mut settled = stream::iter(requests.into_iter().enumerate())
            .map(|(index, request)| async move {
                tracing::debug!(index, "task started");
                let outcome = translate_text(provider, &request, None).await;
                tracing::debug!(index, ok = outcome.is_ok(), "task settled");
                (index, outcome)
            })
            .buffer_unordered(limit);

        while let Some((index, outcome)) = settled.next().await {
            outcomes[index] = Some(outcome);
        }

        outcomes
            .into_iter()
            .map(|outcome| {
                outcome.unwrap_or_else(|| {
                    Err(ProviderError::Transport(
                        "Translation task did not produce a result.".to_string(),
                    ))
                })
            })
            .collect()
    }

    /// Translates files, then writes each success to its planned destination.
    ///
    /// A write failure turns that file's result into a failure; the
    /// translation is not repeated.
    pub async fn translate_files(
        &self,
        tasks: Vec<FileTask>,
        mode: &OutputMode,
        writer: &OutputWriter<'_>,
        reporter: Reporter<'_>,
    ) -> Vec<TranslationFileResult> {
        let (files, requests): (Vec<_>, Vec<_>) = tasks.into_iter().map(|t| (t.file, t.request)).unzip();
        let outcomes = self.run(requests).await;

        files
            .into_iter()
            .zip(outcomes)
            .map(|(file, outcome)| match outcome {
                Err(e) => TranslationFileResult::failed(file, e.to_string()),
                Ok(translated) => {
                    if translated.stripped_fence {
                        reporter.fence_stripped();
                    }
                    let destination = mode.destination_for(&file);
                    match writer.write(&translated.text, mode, destination) {
                        Ok(written) => {
                            reporter.metadata(translated.usage, translated.elapsed_ms, written.as_deref());
                            TranslationFileResult::succeeded(file, written)
                        }
                        Err(e) => TranslationFileResult::failed(file, e.to_string()),
                    }
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("provider", &self.provider.name())
            .field("jobs", &self.jobs)
            .finish()
    }
}
