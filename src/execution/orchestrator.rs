//! The translate command from resolved configuration to written output.

use anyhow::Result;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use super::confirm::{ConfirmationPrompter, Confirmer};
use super::planner::{OutputMode, OutputPlan, PlanRequest, plan_output};
use super::report::{Reporter, TranslationFileResult, summarize};
use super::scheduler::{FileTask, Scheduler, translate_text};
use super::writer::OutputWriter;
use crate::catalog::{BatchTranslator, translate_catalog_file};
use crate::config::{ResolvedConfig, collision_warnings};
use crate::error::AppError;
use crate::input::{
    FormatHint, InputMode, Inspection, ResolvedInputFile, detect_format, inspect, resolve_input,
};
use crate::output::Terminal;
use crate::provider::session::ModelSession;
use crate::provider::{
    BackendId, HttpClient, ProviderFactory, ProviderRequest, ProviderSelection, SelectionRequest,
};
use crate::translation::{
    CATALOG_PRESET, DryRun, NormalizedLanguage, PresetDefinition, PromptContext, PromptOverrides,
    ResolvedPromptSet, normalize_from, normalize_to, render_catalog_dry_run, resolve_preset,
    resolve_prompts,
};
use crate::ui::Spinner;

pub const FILES_FAILED_MESSAGE: &str = "One or more files failed.";

/// Flags of the translate command.
#[derive(Debug, Clone, Default)]
pub struct TranslateOptions {
    pub input: Vec<String>,
    pub text: bool,
    pub output: Option<String>,
    pub in_place: bool,
    pub suffix: Option<String>,
    pub stream: bool,
    pub yes: bool,
    pub jobs: Option<usize>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub preset: Option<String>,
    pub system_prompt: Option<String>,
    pub user_prompt: Option<String>,
    pub context: Option<String>,
    pub no_lang: bool,
    pub format: Option<FormatHint>,
    pub dry_run: bool,
}

impl TranslateOptions {
    /// Prompt flags that a promptless backend ignores.
    fn prompt_flags(&self) -> Vec<&'static str> {
        [
            ("system-prompt", self.system_prompt.is_some()),
            ("user-prompt", self.user_prompt.is_some()),
            ("context", self.context.is_some()),
            ("preset", self.preset.is_some()),
            ("format", self.format.is_some()),
        ]
        .into_iter()
        .filter_map(|(flag, set)| set.then_some(flag))
        .collect()
    }
}

/// Process-level collaborators, injected so the whole flow runs in tests.
pub struct Runtime<'a> {
    pub terminal: &'a dyn Terminal,
    pub cwd: PathBuf,
    pub home: PathBuf,
    /// Environment variables consulted for API keys.
    pub env: BTreeMap<String, String>,
    pub http: HttpClient,
    pub confirmer: Arc<dyn Confirmer>,
    pub sessions: Vec<(BackendId, Arc<dyn ModelSession>)>,
}

/// Everything resolved before any input is read.
struct Settings {
    preset: PresetDefinition,
    provider_name: String,
    from: NormalizedLanguage,
    to: NormalizedLanguage,
    format: FormatHint,
    jobs: usize,
    assume_yes: bool,
    stream: bool,
}

/// Runs one translate invocation.
///
/// # Errors
///
/// Returns an [`AppError`] for invalid flags, declined confirmations and
/// failed files, or the backend's error for a failed single translation.
pub async fn run_translation(
    runtime: Runtime<'_>,
    config: ResolvedConfig,
    options: TranslateOptions,
    read_stdin: impl FnOnce() -> Result<String>,
) -> Result<()> {
    let terminal = runtime.terminal;
    if terminal.is_verbose() && terminal.is_quiet() {
        return Err(AppError::invalid_arguments("--verbose and --quiet cannot be used together.").into());
    }
    for warning in collision_warnings(&config) {
        terminal.warn(&warning);
    }

    let settings = resolve_settings(terminal, &config, &options)?;

    let input = resolve_input(
        &options.input,
        options.text,
        terminal.stdin_is_tty(),
        &runtime.cwd,
        read_stdin,
    )?;
    if options.jobs.is_some() && !input.is_files() {
        terminal.warn("--jobs has no effect for non-file input.");
    }

    let plan = plan_output(&PlanRequest {
        input: &input,
        to: &settings.to,
        output: options.output.as_deref(),
        in_place: options.in_place,
        suffix: options.suffix.as_deref(),
        cwd: &runtime.cwd,
    })?;
    for warning in &plan.warnings {
        terminal.warn(warning);
    }

    let run = Invocation {
        runtime: &runtime,
        config: &config,
        options: &options,
        settings,
        plan,
    };
    match &input {
        InputMode::InlineText(text) | InputMode::Stdin(text) => run.translate_text_input(text).await,
        InputMode::Files { files, .. } => run.translate_files(files).await,
    }
}

fn resolve_settings(
    terminal: &dyn Terminal,
    config: &ResolvedConfig,
    options: &TranslateOptions,
) -> Result<Settings, AppError> {
    let defaults = &config.defaults;
    let preset_name = options.preset.as_deref().unwrap_or(&defaults.preset);
    let preset = resolve_preset(preset_name, &config.presets)?;

    let provider_name = if options.base_url.is_some() && options.provider.is_none() {
        terminal.info("--base-url provided; provider set to openai-compatible.");
        BackendId::OpenAiCompatible.as_str().to_string()
    } else {
        options
            .provider
            .clone()
            .or_else(|| preset.provider.clone())
            .unwrap_or_else(|| defaults.provider.clone())
    };

    let from = normalize_from(
        options
            .from
            .as_deref()
            .or(preset.from.as_deref())
            .unwrap_or(&defaults.from),
    )?;
    let to = normalize_to(
        options
            .to
            .as_deref()
            .or(preset.to.as_deref())
            .unwrap_or(&defaults.to),
    )?;
    let format = options
        .format
        .or_else(|| preset.format.as_deref().and_then(FormatHint::parse))
        .unwrap_or(defaults.format);

    Ok(Settings {
        provider_name,
        from,
        to,
        format,
        jobs: options.jobs.unwrap_or(defaults.jobs).max(1),
        assume_yes: options.yes || defaults.yes,
        stream: options.stream || defaults.stream,
        preset,
    })
}

struct Invocation<'r, 'a> {
    runtime: &'r Runtime<'a>,
    config: &'r ResolvedConfig,
    options: &'r TranslateOptions,
    settings: Settings,
    plan: OutputPlan,
}

impl Invocation<'_, '_> {
    fn terminal(&self) -> &dyn Terminal {
        self.runtime.terminal
    }

    fn factory(&self) -> ProviderFactory {
        let http = self.runtime.http.configured_for(&self.config.network);
        self.runtime.sessions.iter().fold(
            ProviderFactory::new(self.config.clone(), self.runtime.env.clone(), http),
            |factory, (backend, session)| factory.with_session(*backend, Arc::clone(session)),
        )
    }

    fn select_provider(&self) -> Result<ProviderSelection, AppError> {
        self.factory().make(&SelectionRequest {
            provider: self.settings.provider_name.clone(),
            explicit_provider: self.options.provider.is_some(),
            model: self.options.model.clone().or_else(|| self.settings.preset.model.clone()),
            base_url: self.options.base_url.clone(),
            api_key: self.options.api_key.clone(),
            require_credentials: !self.options.dry_run,
        })
    }

    /// Unrendered templates for the selected backend, with their warnings shown.
    fn base_prompts(&self, selection: &ProviderSelection) -> Result<ResolvedPromptSet, AppError> {
        if selection.promptless {
            for flag in self.options.prompt_flags() {
                self.terminal().warn(&format!(
                    "--{flag} is ignored when using {}. This provider does not support custom prompts.",
                    selection.name
                ));
            }
            return Ok(ResolvedPromptSet::default());
        }

        let overrides = PromptOverrides {
            system_prompt: self.options.system_prompt.as_deref(),
            user_prompt: self.options.user_prompt.as_deref(),
            no_lang: self.options.no_lang,
        };
        let (prompts, warnings) =
            resolve_prompts(&self.settings.preset, overrides, &self.runtime.cwd, &self.runtime.home)?;
        for warning in warnings {
            self.terminal().warn(&warning);
        }
        Ok(prompts)
    }

    fn request(&self, text: &str, prompts: &ResolvedPromptSet, file: Option<&ResolvedInputFile>) -> ProviderRequest {
        let format = detect_format(self.settings.format, file.map(|f| f.path.as_path()));
        let filename = file.map(ResolvedInputFile::display_name).unwrap_or_default();
        let rendered = prompts.render(&PromptContext {
            text,
            from: &self.settings.from,
            to: &self.settings.to,
            context: self.options.context.as_deref().unwrap_or_default(),
            filename: &filename,
            format,
        });

        ProviderRequest {
            from: self.settings.from.clone(),
            to: self.settings.to.clone(),
            system_prompt: rendered.system(),
            user_prompt: rendered.user(),
            text: text.to_string(),
            timeout_seconds: self.config.network.timeout_seconds,
            network: self.config.network,
        }
    }

    fn dry_run(&self, selection: &ProviderSelection, request: &ProviderRequest) -> Result<()> {
        let prompts = ResolvedPromptSet {
            system_prompt: request.system_prompt.clone().unwrap_or_default(),
            user_prompt: request.user_prompt.clone().unwrap_or_default(),
            custom_prompt_active: false,
        };
        let report = DryRun {
            provider: &selection.name,
            model: selection.model.as_deref(),
            from: &self.settings.from,
            to: &self.settings.to,
            prompts: &prompts,
            input: &request.text,
        }
        .render();
        self.terminal().print_line(&report)?;
        Ok(())
    }

    fn prompter(&self) -> ConfirmationPrompter {
        ConfirmationPrompter::with_confirmer(
            self.settings.assume_yes,
            self.terminal().stdin_is_tty(),
            Arc::clone(&self.runtime.confirmer),
        )
    }

    fn reporter<'s>(&'s self, selection: &'s ProviderSelection) -> Reporter<'s> {
        Reporter {
            terminal: self.terminal(),
            provider: &selection.name,
            model: selection.model.as_deref(),
        }
    }

    async fn translate_text_input(&self, text: &str) -> Result<()> {
        let selection = self.select_provider()?;
        let prompts = self.base_prompts(&selection)?;
        let request = self.request(text, &prompts, None);
        if self.options.dry_run {
            return self.dry_run(&selection, &request);
        }

        let writer = OutputWriter::new(self.terminal(), self.prompter());
        self.translate_one(&selection, &request, &writer).await?;
        Ok(())
    }

    /// The single-translation path: optional streaming, spinner, then write.
    async fn translate_one(
        &self,
        selection: &ProviderSelection,
        request: &ProviderRequest,
        writer: &OutputWriter<'_>,
    ) -> Result<Option<PathBuf>> {
        let mode = &self.plan.mode;
        let stream_to = (self.settings.stream && mode.is_stdout()).then(|| self.terminal());

        let translated = {
            let spinner = stream_to
                .is_none()
                .then(|| Spinner::new("Translating...", self.terminal().is_quiet()));
            let outcome = translate_text(selection.provider.as_ref(), request, stream_to).await;
            if let Some(spinner) = spinner {
                spinner.stop();
            }
            outcome?
        };

        let reporter = self.reporter(selection);
        if translated.stripped_fence {
            reporter.fence_stripped();
        }
        let destination = if translated.streamed {
            None
        } else {
            writer.write(&translated.text, mode, None)?
        };
        reporter.metadata(translated.usage, translated.elapsed_ms, destination.as_deref());
        Ok(destination)
    }

    async fn translate_files(&self, files: &[ResolvedInputFile]) -> Result<()> {
        let terminal = self.terminal();
        let (catalogs, text_files): (Vec<_>, Vec<_>) = files.iter().cloned().partition(ResolvedInputFile::is_catalog);

        let mut results = Vec::new();
        let mut sources = Vec::new();
        for file in text_files {
            match inspect(&file) {
                Inspection::Text(text) => sources.push((file, text)),
                Inspection::Skipped(warning) => terminal.warn(&warning),
                Inspection::Failed(message) => {
                    terminal.error(&format!("Error: {message}"));
                    results.push(TranslationFileResult::failed(file, message));
                }
            }
        }

        if sources.is_empty() && catalogs.is_empty() {
            return finish(terminal, &results);
        }

        let selection = self.select_provider()?;
        let prompts = self.base_prompts(&selection)?;

        if self.options.dry_run {
            if let Some((file, text)) = sources.first() {
                self.dry_run(&selection, &self.request(text, &prompts, Some(file)))?;
            } else {
                let report = render_catalog_dry_run(
                    &selection.name,
                    selection.model.as_deref(),
                    &self.settings.to,
                    self.settings.jobs,
                    &catalogs,
                );
                terminal.print_line(&report)?;
            }
            return Ok(());
        }

        if let OutputMode::PerFile {
            targets,
            in_place: true,
        } = &self.plan.mode
        {
            self.prompter()
                .confirm(&format!("This will overwrite {} file(s). Proceed?", targets.len()))?;
        }

        let writer = OutputWriter::new(terminal, self.prompter())
            .skip_overwrite_confirmation(self.plan.mode.is_in_place());
        let scheduler = Scheduler::new(Arc::clone(&selection.provider), self.settings.jobs);

        if !catalogs.is_empty() {
            let templates = if selection.promptless {
                None
            } else {
                let preset = resolve_preset(CATALOG_PRESET, &self.config.presets)?;
                let (templates, _) =
                    resolve_prompts(&preset, PromptOverrides::default(), &self.runtime.cwd, &self.runtime.home)?;
                Some(templates)
            };
            let translator = BatchTranslator::new(scheduler.clone(), templates, self.config.network);
            for file in &catalogs {
                let result =
                    translate_catalog_file(file, &self.settings.to, &translator, &self.plan.mode, &writer).await;
                results.push(result);
            }
        }

        if let [(file, text)] = sources.as_slice()
            && catalogs.is_empty()
            && self.plan.mode.is_stdout()
        {
            let request = self.request(text, &prompts, Some(file));
            let result = match self.translate_one(&selection, &request, &writer).await {
                Ok(destination) => TranslationFileResult::succeeded(file.clone(), destination),
                Err(e) => TranslationFileResult::failed(file.clone(), e.to_string()),
            };
            results.push(result);
        } else if !sources.is_empty() {
            let tasks = sources
                .iter()
                .map(|(file, text)| FileTask {
                    file: file.clone(),
                    request: self.request(text, &prompts, Some(file)),
                })
                .collect();
            let translated = scheduler
                .translate_files(tasks, &self.plan.mode, &writer, self.reporter(&selection))
                .await;
            results.extend(translated);
        }

        finish(terminal, &results)
    }
}

fn finish(terminal: &dyn Terminal, results: &[TranslationFileResult]) -> Result<()> {
    if summarize(terminal, results) {
        return Err(AppError::runtime(FILES_FAILED_MESSAGE).into());
    }
    Ok(())
}
