#![allow(clippy::unwrap_used)]
//! Scheduler and output planner contract tests, through the public API.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

use translate_cli::execution::{
    ConfirmationPrompter, FileTask, OutputMode, OutputWriter, PlanRequest, Reporter, Scheduler, plan_output,
};
use translate_cli::input::{InputMode, ResolvedInputFile};
use translate_cli::output::MemoryTerminal;
use translate_cli::provider::{
    NetworkConfig, ProviderError, ProviderRequest, ProviderResult, TranslationProvider,
};
use translate_cli::translation::{normalize_from, normalize_to};

/// Upper-cases text after a delay proportional to its length; fails on "boom".
#[derive(Default)]
struct SlowUpper {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl TranslationProvider for SlowUpper {
    fn name(&self) -> &str {
        "slow-upper"
    }

    async fn translate(&self, request: &ProviderRequest) -> Result<ProviderResult, ProviderError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5 * request.text.len() as u64)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if request.text == "boom" {
            return Err(ProviderError::Http {
                status: 500,
                headers: Default::default(),
                body: "internal".into(),
            });
        }
        Ok(ProviderResult {
            text: request.text.to_uppercase(),
            ..ProviderResult::default()
        })
    }
}

fn request(text: &str) -> ProviderRequest {
    ProviderRequest {
        from: normalize_from("auto").unwrap(),
        to: normalize_to("fr").unwrap(),
        system_prompt: None,
        user_prompt: None,
        text: text.to_string(),
        timeout_seconds: 5,
        network: NetworkConfig::default(),
    }
}

#[tokio::test]
async fn test_results_follow_input_order_under_bound() {
    let provider = Arc::new(SlowUpper::default());
    let scheduler = Scheduler::new(provider.clone(), 3);
    let texts = ["aaaaaaaaaa", "b", "ccccc", "dd", "eeeeeeee", "f"];

    let outcomes = scheduler.run(texts.iter().map(|t| request(t)).collect()).await;

    let translated: Vec<_> = outcomes.into_iter().map(|o| o.unwrap().text).collect();
    assert_eq!(translated, ["AAAAAAAAAA", "B", "CCCCC", "DD", "EEEEEEEE", "F"]);
    assert!(provider.peak.load(Ordering::SeqCst) <= 3);
}

#[tokio::test]
async fn test_failure_does_not_cancel_siblings() {
    let scheduler = Scheduler::new(Arc::new(SlowUpper::default()), 2);

    let outcomes = scheduler.run(vec![request("boom"), request("ok"), request("fine")]).await;

    assert_eq!(outcomes[0].as_ref().unwrap_err().to_string(), "API error (HTTP 500): internal");
    assert_eq!(outcomes[1].as_ref().unwrap().text, "OK");
    assert_eq!(outcomes[2].as_ref().unwrap().text, "FINE");
}

#[test]
fn test_concurrency_bound() {
    let scheduler = Scheduler::new(Arc::new(SlowUpper::default()), 0);
    assert_eq!(scheduler.concurrency(10), 1);

    let scheduler = Scheduler::new(Arc::new(SlowUpper::default()), 8);
    assert_eq!(scheduler.concurrency(3), 3);
    assert_eq!(scheduler.concurrency(0), 1);
}

#[tokio::test]
async fn test_planned_files_are_written_next_to_inputs() {
    let dir = TempDir::new().unwrap();
    let files: Vec<_> = ["a.md", "b.md"]
        .iter()
        .map(|name| {
            let path = dir.path().join(name);
            std::fs::write(&path, *name).unwrap();
            ResolvedInputFile::new(path, true)
        })
        .collect();
    let input = InputMode::Files {
        files: files.clone(),
        came_from_glob: true,
    };
    let to = normalize_to("fr").unwrap();
    let plan = plan_output(&PlanRequest {
        input: &input,
        to: &to,
        output: None,
        in_place: false,
        suffix: Some(".fr"),
        cwd: dir.path(),
    })
    .unwrap();
    assert!(matches!(plan.mode, OutputMode::PerFile { in_place: false, .. }));

    let terminal = MemoryTerminal::new();
    let writer = OutputWriter::new(&terminal, ConfirmationPrompter::new(false, false));
    let reporter = Reporter {
        terminal: &terminal,
        provider: "slow-upper",
        model: None,
    };
    let tasks = files
        .into_iter()
        .map(|file| FileTask {
            request: request(&file.display_name()),
            file,
        })
        .collect();

    let results = Scheduler::new(Arc::new(SlowUpper::default()), 2)
        .translate_files(tasks, &plan.mode, &writer, reporter)
        .await;

    assert!(results.iter().all(|r| r.success));
    let read = |name: &str| std::fs::read_to_string(dir.path().join(name)).unwrap();
    assert_eq!(read("a.fr.md"), "A.MD");
    assert_eq!(read("b.fr.md"), "B.MD");
    assert_eq!(results[1].destination.as_deref(), Some(Path::new(&dir.path().join("b.fr.md"))));
}

#[test]
fn test_output_with_many_inputs_is_rejected() {
    let input = InputMode::Files {
        files: vec![
            ResolvedInputFile::new("/w/a.md".into(), false),
            ResolvedInputFile::new("/w/b.md".into(), false),
        ],
        came_from_glob: false,
    };
    let to = normalize_to("fr").unwrap();

    let err = plan_output(&PlanRequest {
        input: &input,
        to: &to,
        output: Some("out.md"),
        in_place: false,
        suffix: None,
        cwd: Path::new("/w"),
    })
    .unwrap_err();

    assert_eq!(
        err.message,
        "--output can only be used with a single input. Use --suffix for multiple files."
    );
}
