//! Running a translation: output planning, scheduling, writing and reporting.

pub(crate) mod confirm;
mod orchestrator;
mod planner;
mod report;
mod scheduler;
mod writer;

pub use confirm::{ABORTED_MESSAGE, ConfirmationPrompter, Confirmer, InquireConfirmer, NOT_A_TTY_MESSAGE};
pub use orchestrator::{FILES_FAILED_MESSAGE, Runtime, TranslateOptions, run_translation};
pub use planner::{
    OutputMode, OutputPlan, OutputTarget, PlanRequest, SUFFIX_ON_STDOUT_WARNING, apply_suffix, plan_output,
};
pub use report::{FENCE_STRIPPED_MESSAGE, Reporter, TranslationFileResult, summarize};
pub use scheduler::{FileTask, Scheduler, Translated, translate_text};
pub use writer::OutputWriter;
