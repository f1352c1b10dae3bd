//! Sequential batch execution with skip-existing, pacing and per-item retries

use crate::clock::{CancelFlag, Clock};
use crate::plan::BatchPlan;
use crate::retrieve::ArtifactRetriever;
use crate::service::{styled_prompt, TaskRequest, TaskService};
use crate::task::round_secs;
use crate::wait::{PollTiming, TaskRunner};
use serde::{Deserialize, Serialize};
use sprite_core::{ContentHash, Result, SpriteError};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One requested asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_filename")]
    pub filename: String,
    /// Target size for post-processing; both must be set to trigger it
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// Item-specific prompt text, appended to the shared style prefix
    #[serde(default, rename = "prompt")]
    pub prompt_fragment: String,
}

fn default_filename() -> String {
    "unknown.png".to_string()
}

impl BatchItem {
    pub fn new(category: &str, filename: &str, prompt: &str) -> Self {
        Self {
            category: category.to_string(),
            filename: filename.to_string(),
            width: None,
            height: None,
            prompt_fragment: prompt.to_string(),
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// `prefix, fragment`, or the fragment alone when the prefix is empty
    pub fn full_prompt(&self, style_prefix: &str) -> String {
        styled_prompt(style_prefix, &self.prompt_fragment)
    }

    /// `output_root/category/filename`
    pub fn destination(&self, output_root: &Path) -> PathBuf {
        output_root.join(&self.category).join(&self.filename)
    }

    pub fn resize_target(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some((w, h)),
            _ => None,
        }
    }
}

/// Retry and pacing policy for a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per item; zero is treated as one
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Pause before each item after the first
    pub submit_delay: Duration,
}

impl RetryPolicy {
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub skip_existing: bool,
    pub retry: RetryPolicy,
}

/// Hook run on a downloaded artifact when its item carries a target size
pub trait PostProcess {
    /// Process the file at `path`, returning where the result now lives
    fn process(&self, path: &Path, width: u32, height: u32) -> Result<PathBuf>;
}

/// Outcome of one batch item. Recorded once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BatchItemOutcome {
    Skipped {
        category: String,
        filename: String,
        output_path: PathBuf,
    },
    Success {
        category: String,
        filename: String,
        output_path: PathBuf,
        artifact_url: String,
        task_id: String,
        content_hash: String,
        attempts: u32,
    },
    Failed {
        category: String,
        filename: String,
        error: String,
        attempts: u32,
    },
}

impl BatchItemOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            BatchItemOutcome::Skipped { .. } => "skipped",
            BatchItemOutcome::Success { .. } => "success",
            BatchItemOutcome::Failed { .. } => "failed",
        }
    }
}

/// Ordered outcomes plus aggregate counts for one batch invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRun {
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub elapsed_seconds: f64,
    /// The run stopped early on an interrupt; remaining items were not attempted
    pub cancelled: bool,
    pub results: Vec<BatchItemOutcome>,
}

impl BatchRun {
    fn new(total: usize) -> Self {
        Self {
            total,
            succeeded: 0,
            skipped: 0,
            failed: 0,
            elapsed_seconds: 0.0,
            cancelled: false,
            results: Vec::with_capacity(total),
        }
    }

    fn record(&mut self, outcome: BatchItemOutcome) {
        match outcome {
            BatchItemOutcome::Skipped { .. } => self.skipped += 1,
            BatchItemOutcome::Success { .. } => self.succeeded += 1,
            BatchItemOutcome::Failed { .. } => self.failed += 1,
        }
        self.results.push(outcome);
    }

    /// True when nothing failed and the run was not interrupted
    pub fn ok(&self) -> bool {
        self.failed == 0 && !self.cancelled
    }
}

struct Stored {
    task_id: String,
    artifact_url: String,
    output_path: PathBuf,
    content_hash: String,
}

/// Runs every item of a plan in order against one service
pub struct BatchOrchestrator<'a> {
    runner: TaskRunner<'a>,
    retriever: &'a dyn ArtifactRetriever,
    clock: &'a dyn Clock,
    cancel: &'a CancelFlag,
    post_process: Option<&'a dyn PostProcess>,
    options: BatchOptions,
}

impl<'a> BatchOrchestrator<'a> {
    pub fn new(
        service: &'a dyn TaskService,
        retriever: &'a dyn ArtifactRetriever,
        clock: &'a dyn Clock,
        cancel: &'a CancelFlag,
        timing: PollTiming,
        options: BatchOptions,
    ) -> Self {
        Self {
            runner: TaskRunner::new(service, clock, cancel, timing),
            retriever,
            clock,
            cancel,
            post_process: None,
            options,
        }
    }

    pub fn with_post_process(mut self, hook: &'a dyn PostProcess) -> Self {
        self.post_process = Some(hook);
        self
    }

    /// Process every item of `plan`. A single item's failure never stops the run.
    pub fn run(&self, plan: &BatchPlan) -> BatchRun {
        let start = self.clock.now();
        let total = plan.items.len();
        let mut run = BatchRun::new(total);
        log::info!("Batch generation started: {} items", total);

        for (idx, item) in plan.items.iter().enumerate() {
            let dest = item.destination(&plan.output_root);

            if self.options.skip_existing && dest.exists() {
                log::info!("[{}/{}] SKIP (exists): {}", idx + 1, total, dest.display());
                run.record(BatchItemOutcome::Skipped {
                    category: item.category.clone(),
                    filename: item.filename.clone(),
                    output_path: dest,
                });
                continue;
            }

            let submit_delay = self.options.retry.submit_delay;
            if idx > 0 && !submit_delay.is_zero() {
                log::info!("Waiting {}s...", submit_delay.as_secs());
                self.clock.sleep(submit_delay);
                if self.cancel.is_cancelled() {
                    run.cancelled = true;
                    break;
                }
            }

            log::info!(
                "[{}/{}] Generating: {}/{}",
                idx + 1,
                total,
                item.category,
                item.filename
            );
            match self.run_item(item, &item.full_prompt(&plan.style_prefix), &dest) {
                Ok(outcome) => run.record(outcome),
                Err(_) => {
                    run.cancelled = true;
                    break;
                }
            }
        }

        run.elapsed_seconds = round_secs(self.clock.now().saturating_sub(start).as_secs_f64());
        if run.cancelled {
            log::warn!(
                "Batch interrupted after {} of {} items",
                run.results.len(),
                total
            );
        }
        log::info!(
            "Batch complete: {} succeeded, {} skipped, {} failed ({:.1}s)",
            run.succeeded,
            run.skipped,
            run.failed,
            run.elapsed_seconds
        );
        run
    }

    /// Attempt one item up to the retry bound. Only `Cancelled` escapes as an error.
    fn run_item(&self, item: &BatchItem, prompt: &str, dest: &Path) -> Result<BatchItemOutcome> {
        let attempts = self.options.retry.attempts();
        let mut last_error = "unknown".to_string();
        let mut made = 0;

        for attempt in 1..=attempts {
            made = attempt;
            match self.attempt(item, prompt, dest) {
                Ok(stored) => {
                    log::info!("[OK] Saved: {}", stored.output_path.display());
                    return Ok(BatchItemOutcome::Success {
                        category: item.category.clone(),
                        filename: item.filename.clone(),
                        output_path: stored.output_path,
                        artifact_url: stored.artifact_url,
                        task_id: stored.task_id,
                        content_hash: stored.content_hash,
                        attempts: attempt,
                    });
                }
                Err(SpriteError::Cancelled) => return Err(SpriteError::Cancelled),
                Err(e) => {
                    log::warn!("Attempt {}/{} failed: {}", attempt, attempts, e);
                    last_error = e.to_string();
                    if !e.is_retryable() {
                        break;
                    }
                }
            }

            if attempt < attempts {
                log::info!("Retrying in {}s...", self.options.retry.retry_delay.as_secs());
                self.clock.sleep(self.options.retry.retry_delay);
                self.cancel.check()?;
            }
        }

        Ok(BatchItemOutcome::Failed {
            category: item.category.clone(),
            filename: item.filename.clone(),
            error: last_error,
            attempts: made,
        })
    }

    /// One fresh submission, wait, download and optional post-processing
    fn attempt(&self, item: &BatchItem, prompt: &str, dest: &Path) -> Result<Stored> {
        let mut task = self.runner.wait(&TaskRequest::prompt(prompt))?;
        if let Some(err) = task.take_failure() {
            return Err(err);
        }
        let (task_id, artifact_url) = match (task.task_id, task.artifact_url) {
            (Some(id), Some(url)) => (id, url),
            _ => {
                return Err(SpriteError::RemoteFailure(
                    "task finished without an artifact".to_string(),
                ))
            }
        };

        self.cancel.check()?;
        self.retriever.retrieve(&artifact_url, dest)?;

        let output_path = match (item.resize_target(), self.post_process) {
            (Some((w, h)), Some(hook)) => hook.process(dest, w, h)?,
            _ => dest.to_path_buf(),
        };
        let content_hash = ContentHash::from_file(&output_path)?.to_prefixed_hex();

        Ok(Stored {
            task_id,
            artifact_url,
            output_path,
            content_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::PollStatus;
    use crate::testing::{temp_dir, ManualClock, RecordingRetriever, ScriptedService, Submit};
    use std::cell::RefCell;

    const SUBMIT_DELAY: Duration = Duration::from_secs(30);
    const RETRY_DELAY: Duration = Duration::from_secs(60);
    const POLL: Duration = Duration::from_secs(10);

    fn success(url: &str) -> PollStatus {
        PollStatus::Success {
            artifact_url: url.to_string(),
        }
    }

    fn options(skip_existing: bool, max_retries: u32) -> BatchOptions {
        BatchOptions {
            skip_existing,
            retry: RetryPolicy {
                max_retries,
                retry_delay: RETRY_DELAY,
                submit_delay: SUBMIT_DELAY,
            },
        }
    }

    fn plan(root: &Path, items: Vec<BatchItem>) -> BatchPlan {
        BatchPlan {
            items,
            style_prefix: "fantasy UI".to_string(),
            output_root: root.to_path_buf(),
        }
    }

    fn timing() -> PollTiming {
        PollTiming::new(POLL, Duration::from_secs(900))
    }

    struct RecordingResize {
        calls: RefCell<Vec<(PathBuf, u32, u32)>>,
    }

    impl PostProcess for RecordingResize {
        fn process(&self, path: &Path, width: u32, height: u32) -> Result<PathBuf> {
            self.calls
                .borrow_mut()
                .push((path.to_path_buf(), width, height));
            Ok(path.to_path_buf())
        }
    }

    #[test]
    fn test_single_item_success() {
        let root = temp_dir("batch_a");
        let service = ScriptedService::accepting(vec![success("https://cdn/U.png")]);
        let retriever = RecordingRetriever::new();
        let clock = ManualClock::new();
        let cancel = CancelFlag::new();
        let orchestrator = BatchOrchestrator::new(
            &service,
            &retriever,
            &clock,
            &cancel,
            timing(),
            options(false, 3),
        );

        let run = orchestrator.run(&plan(
            &root,
            vec![BatchItem::new("icons", "sword.png", "a sword")],
        ));
        let dest = root.join("icons").join("sword.png");

        assert!(run.ok());
        assert_eq!((run.total, run.succeeded, run.failed, run.skipped), (1, 1, 0, 0));
        match &run.results[0] {
            BatchItemOutcome::Success {
                output_path,
                artifact_url,
                task_id,
                attempts,
                ..
            } => {
                assert_eq!(output_path, &dest);
                assert_eq!(artifact_url, "https://cdn/U.png");
                assert_eq!(task_id, "gen-1");
                assert_eq!(*attempts, 1);
            }
            other => panic!("expected success, got {:?}", other),
        }
        assert_eq!(
            *retriever.downloads.borrow(),
            vec![("https://cdn/U.png".to_string(), dest)]
        );
        assert_eq!(
            *service.calls.borrow(),
            vec!["submit:fantasy UI, a sword".to_string(), "poll:gen-1".to_string()]
        );
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_skip_existing_middle_item() {
        let root = temp_dir("batch_b");
        std::fs::create_dir_all(root.join("frames")).unwrap();
        std::fs::write(root.join("frames").join("b.png"), b"done").unwrap();

        let service = ScriptedService::accepting(vec![success("https://cdn/x.png")]);
        let retriever = RecordingRetriever::new();
        let clock = ManualClock::new();
        let cancel = CancelFlag::new();
        let orchestrator = BatchOrchestrator::new(
            &service,
            &retriever,
            &clock,
            &cancel,
            timing(),
            options(true, 3),
        );

        let run = orchestrator.run(&plan(
            &root,
            vec![
                BatchItem::new("frames", "a.png", "a"),
                BatchItem::new("frames", "b.png", "b"),
                BatchItem::new("frames", "c.png", "c"),
            ],
        ));

        assert!(run.ok());
        assert_eq!((run.total, run.succeeded, run.skipped, run.failed), (3, 2, 1, 0));
        let labels: Vec<_> = run.results.iter().map(|r| r.label()).collect();
        assert_eq!(labels, vec!["success", "skipped", "success"]);
        assert_eq!(service.submit_count(), 2);
        // the third item is still paced by its list position
        assert_eq!(clock.sleeps_of(SUBMIT_DELAY), 1);
        assert_eq!(std::fs::read(root.join("frames").join("b.png")).unwrap(), b"done");
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_rerun_over_complete_outputs_makes_no_calls() {
        let root = temp_dir("batch_idem");
        let items = vec![
            BatchItem::new("icons", "a.png", "a"),
            BatchItem::new("icons", "b.png", "b"),
        ];
        for item in &items {
            let dest = item.destination(&root);
            std::fs::create_dir_all(dest.parent().unwrap()).unwrap();
            std::fs::write(dest, b"x").unwrap();
        }

        let service = ScriptedService::accepting(vec![success("https://cdn/x.png")]);
        let retriever = RecordingRetriever::new();
        let clock = ManualClock::new();
        let cancel = CancelFlag::new();
        let orchestrator = BatchOrchestrator::new(
            &service,
            &retriever,
            &clock,
            &cancel,
            timing(),
            options(true, 3),
        );

        let run = orchestrator.run(&plan(&root, items));
        assert_eq!(run.skipped, run.total);
        assert!(service.calls.borrow().is_empty());
        assert!(retriever.downloads.borrow().is_empty());
        assert_eq!(clock.sleep_count(), 0);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_missing_task_id_exhausts_retries() {
        let root = temp_dir("batch_c");
        let body = r#"{"code":0,"data":{}}"#;
        let service = ScriptedService::new(vec![Submit::Reject(body)], vec![]);
        let retriever = RecordingRetriever::new();
        let clock = ManualClock::new();
        let cancel = CancelFlag::new();
        let orchestrator = BatchOrchestrator::new(
            &service,
            &retriever,
            &clock,
            &cancel,
            timing(),
            options(false, 3),
        );

        let run = orchestrator.run(&plan(&root, vec![BatchItem::new("icons", "a.png", "a")]));

        assert!(!run.ok());
        assert_eq!(run.failed, 1);
        assert_eq!(service.submit_count(), 3);
        assert_eq!(service.poll_count(), 0);
        assert_eq!(clock.sleeps_of(RETRY_DELAY), 2);
        match &run.results[0] {
            BatchItemOutcome::Failed { error, attempts, .. } => {
                assert!(error.contains(body));
                assert_eq!(*attempts, 3);
            }
            other => panic!("expected failure, got {:?}", other),
        }
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_zero_retries_still_attempts_once() {
        let root = temp_dir("batch_zero");
        let service = ScriptedService::new(vec![Submit::Unreachable], vec![]);
        let retriever = RecordingRetriever::new();
        let clock = ManualClock::new();
        let cancel = CancelFlag::new();
        let orchestrator = BatchOrchestrator::new(
            &service,
            &retriever,
            &clock,
            &cancel,
            timing(),
            options(false, 0),
        );

        let run = orchestrator.run(&plan(&root, vec![BatchItem::new("icons", "a.png", "a")]));
        assert_eq!(service.submit_count(), 1);
        assert_eq!(clock.sleeps_of(RETRY_DELAY), 0);
        assert_eq!(run.failed, 1);
        let _ = std::fs::remove_dir_all(&root);
    }

    struct FailingResize;

    impl PostProcess for FailingResize {
        fn process(&self, _path: &Path, _width: u32, _height: u32) -> Result<PathBuf> {
            Err(SpriteError::ConfigurationError("no encoder".into()))
        }
    }

    #[test]
    fn test_non_retryable_error_stops_attempts() {
        let root = temp_dir("batch_fatal");
        let service = ScriptedService::accepting(vec![success("https://cdn/x.png")]);
        let retriever = RecordingRetriever::new();
        let clock = ManualClock::new();
        let cancel = CancelFlag::new();
        let orchestrator = BatchOrchestrator::new(
            &service,
            &retriever,
            &clock,
            &cancel,
            timing(),
            options(false, 3),
        )
        .with_post_process(&FailingResize);

        let run = orchestrator.run(&plan(
            &root,
            vec![BatchItem::new("icons", "a.png", "a").with_size(8, 8)],
        ));
        assert_eq!(run.failed, 1);
        assert_eq!(service.submit_count(), 1);
        assert_eq!(clock.sleeps_of(RETRY_DELAY), 0);
        match &run.results[0] {
            BatchItemOutcome::Failed { error, attempts, .. } => {
                assert!(error.contains("no encoder"));
                assert_eq!(*attempts, 1);
            }
            other => panic!("expected failure, got {:?}", other),
        }
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_retry_uses_fresh_submission_after_download_failure() {
        let root = temp_dir("batch_retry");
        let service = ScriptedService::new(
            vec![Submit::Accept("gen-1"), Submit::Accept("gen-2")],
            vec![success("https://cdn/1.png"), success("https://cdn/2.png")],
        );
        let retriever = RecordingRetriever::failing_first(1);
        let clock = ManualClock::new();
        let cancel = CancelFlag::new();
        let orchestrator = BatchOrchestrator::new(
            &service,
            &retriever,
            &clock,
            &cancel,
            timing(),
            options(false, 3),
        );

        let run = orchestrator.run(&plan(&root, vec![BatchItem::new("icons", "a.png", "a")]));
        assert!(run.ok());
        assert_eq!(service.submit_count(), 2);
        match &run.results[0] {
            BatchItemOutcome::Success {
                task_id,
                artifact_url,
                attempts,
                ..
            } => {
                assert_eq!(task_id, "gen-2");
                assert_eq!(artifact_url, "https://cdn/2.png");
                assert_eq!(*attempts, 2);
            }
            other => panic!("expected success, got {:?}", other),
        }
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_post_process_only_with_both_dimensions() {
        let root = temp_dir("batch_resize");
        let service = ScriptedService::accepting(vec![success("https://cdn/x.png")]);
        let retriever = RecordingRetriever::new();
        let clock = ManualClock::new();
        let cancel = CancelFlag::new();
        let resize = RecordingResize {
            calls: RefCell::new(Vec::new()),
        };
        let orchestrator = BatchOrchestrator::new(
            &service,
            &retriever,
            &clock,
            &cancel,
            timing(),
            options(false, 1),
        )
        .with_post_process(&resize);

        let mut half = BatchItem::new("icons", "half.png", "h");
        half.width = Some(64);
        let run = orchestrator.run(&plan(
            &root,
            vec![BatchItem::new("icons", "full.png", "f").with_size(64, 64), half],
        ));

        assert_eq!(run.succeeded, 2);
        assert_eq!(
            *resize.calls.borrow(),
            vec![(root.join("icons").join("full.png"), 64, 64)]
        );
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_cancel_during_submit_delay_stops_run() {
        let root = temp_dir("batch_cancel");
        let service = ScriptedService::accepting(vec![success("https://cdn/x.png")]);
        let retriever = RecordingRetriever::new();
        let cancel = CancelFlag::new();
        // first sleep is item 1's poll, second is the submit delay before item 2
        let clock = ManualClock::cancelling_after(2, &cancel);
        let orchestrator = BatchOrchestrator::new(
            &service,
            &retriever,
            &clock,
            &cancel,
            timing(),
            options(false, 3),
        );

        let run = orchestrator.run(&plan(
            &root,
            vec![
                BatchItem::new("icons", "a.png", "a"),
                BatchItem::new("icons", "b.png", "b"),
                BatchItem::new("icons", "c.png", "c"),
            ],
        ));

        assert!(run.cancelled);
        assert!(!run.ok());
        assert_eq!(run.total, 3);
        assert_eq!(run.results.len(), 1);
        assert_eq!(run.succeeded, 1);
        assert_eq!(service.submit_count(), 1);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_configuration_error_at_submit_is_not_retried() {
        let root = temp_dir("batch_misconfigured");
        let service = ScriptedService::new(
            vec![Submit::Misconfigured("text_to_model requires a non-empty prompt")],
            vec![],
        );
        let retriever = RecordingRetriever::new();
        let clock = ManualClock::new();
        let cancel = CancelFlag::new();
        let orchestrator = BatchOrchestrator::new(
            &service,
            &retriever,
            &clock,
            &cancel,
            timing(),
            options(false, 3),
        );

        let run = orchestrator.run(&plan(&root, vec![BatchItem::new("icons", "a.png", "a")]));
        assert_eq!(run.failed, 1);
        assert_eq!(service.submit_count(), 1);
        assert_eq!(service.poll_count(), 0);
        assert_eq!(clock.sleeps_of(RETRY_DELAY), 0);
        match &run.results[0] {
            BatchItemOutcome::Failed { error, attempts, .. } => {
                assert_eq!(
                    error,
                    "Configuration error: text_to_model requires a non-empty prompt"
                );
                assert_eq!(*attempts, 1);
            }
            other => panic!("expected failure, got {:?}", other),
        }
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_unreachable_service_error_keeps_network_label() {
        let root = temp_dir("batch_unreachable");
        let service = ScriptedService::new(vec![Submit::Unreachable], vec![]);
        let retriever = RecordingRetriever::new();
        let clock = ManualClock::new();
        let cancel = CancelFlag::new();
        let orchestrator = BatchOrchestrator::new(
            &service,
            &retriever,
            &clock,
            &cancel,
            timing(),
            options(false, 2),
        );

        let run = orchestrator.run(&plan(&root, vec![BatchItem::new("icons", "a.png", "a")]));
        assert_eq!(service.submit_count(), 2);
        match &run.results[0] {
            BatchItemOutcome::Failed { error, .. } => {
                assert_eq!(error, "Network error: connection refused");
            }
            other => panic!("expected failure, got {:?}", other),
        }
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_cancel_during_retry_delay_records_nothing() {
        let root = temp_dir("batch_cancel_retry");
        let service = ScriptedService::new(vec![Submit::Unreachable], vec![]);
        let retriever = RecordingRetriever::new();
        let cancel = CancelFlag::new();
        let clock = ManualClock::cancelling_after(1, &cancel);
        let orchestrator = BatchOrchestrator::new(
            &service,
            &retriever,
            &clock,
            &cancel,
            timing(),
            options(false, 3),
        );

        let run = orchestrator.run(&plan(&root, vec![BatchItem::new("icons", "a.png", "a")]));
        assert!(run.cancelled);
        assert!(run.results.is_empty());
        assert_eq!(service.submit_count(), 1);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = BatchItemOutcome::Failed {
            category: "icons".into(),
            filename: "a.png".into(),
            error: "Timed out: timeout after 901s".into(),
            attempts: 3,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["filename"], "a.png");
        assert_eq!(json["attempts"], 3);
    }

    #[test]
    fn test_full_prompt() {
        let item = BatchItem::new("icons", "a.png", "golden frame");
        assert_eq!(item.full_prompt("WoW style"), "WoW style, golden frame");
        assert_eq!(item.full_prompt(""), "golden frame");
    }
}
