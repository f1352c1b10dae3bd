//! Wait-for-completion loop for a single task
//!
//! Submits once, then alternates deadline check, sleep, cancellation check and
//! a single status query until the task reaches a terminal state.

use crate::clock::{CancelFlag, Clock};
use crate::retrieve::ArtifactRetriever;
use crate::service::{PollStatus, TaskRequest, TaskService};
use crate::task::{GenerationTask, TaskReport};
use sprite_core::{ContentHash, Result};
use std::path::Path;
use std::time::Duration;

/// Poll cadence and overall deadline for one task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTiming {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl PollTiming {
    pub fn new(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval,
            timeout,
        }
    }
}

/// Drives one task from submission to a terminal state
pub struct TaskRunner<'a> {
    service: &'a dyn TaskService,
    clock: &'a dyn Clock,
    cancel: &'a CancelFlag,
    timing: PollTiming,
}

impl<'a> TaskRunner<'a> {
    pub fn new(
        service: &'a dyn TaskService,
        clock: &'a dyn Clock,
        cancel: &'a CancelFlag,
        timing: PollTiming,
    ) -> Self {
        Self {
            service,
            clock,
            cancel,
            timing,
        }
    }

    /// Submit `request` and poll until it finishes.
    ///
    /// Every failure is folded into the returned task's terminal state. The only
    /// error is `Cancelled`, raised before a submission or after a sleep.
    pub fn wait(&self, request: &TaskRequest) -> Result<GenerationTask> {
        let start = self.clock.now();
        let mut task = GenerationTask::new(self.service.service());

        self.cancel.check()?;
        let task_id = match self.service.submit(request) {
            Ok(id) => id,
            Err(e) => {
                log::warn!("{} submission failed: {}", task.service, e);
                task.reject(e);
                task.elapsed_seconds = self.elapsed_since(start).as_secs_f64();
                return Ok(task);
            }
        };
        log::info!("Task submitted: {}", task_id);
        task.accept(task_id.clone());

        loop {
            let elapsed = self.elapsed_since(start);
            if elapsed > self.timing.timeout {
                task.time_out(format!("timeout after {}s", elapsed.as_secs()));
                break;
            }

            self.clock.sleep(self.timing.poll_interval);
            self.cancel.check()?;

            let status = self.service.poll(&task_id);
            task.polls += 1;
            match status {
                PollStatus::Processing { progress } => {
                    let elapsed = self.elapsed_since(start).as_secs();
                    match progress {
                        Some(p) => log::info!(
                            "Polling... elapsed={}s status=processing {}%",
                            elapsed,
                            p
                        ),
                        None => log::info!("Polling... elapsed={}s status=processing", elapsed),
                    }
                }
                PollStatus::Success { artifact_url } => {
                    task.succeed(artifact_url);
                    break;
                }
                PollStatus::Failed { error } | PollStatus::Error { error } => {
                    task.fail(error);
                    break;
                }
            }
        }

        task.elapsed_seconds = self.elapsed_since(start).as_secs_f64();
        Ok(task)
    }

    /// Run one task and, when `download` is given, store its artifact there.
    ///
    /// The report carries the stored path and content hash on success. A
    /// download failure turns the report into a failure with status `download_failed`.
    pub fn run_single(
        &self,
        request: &TaskRequest,
        download: Option<(&dyn ArtifactRetriever, &Path)>,
    ) -> Result<TaskReport> {
        let task = self.wait(request)?;
        let mut report = TaskReport::from_task(&task);

        let (retriever, dest) = match download {
            Some(d) => d,
            None => return Ok(report),
        };
        let url = match (&task.artifact_url, task.is_succeeded()) {
            (Some(url), true) => url,
            _ => return Ok(report),
        };

        self.cancel.check()?;
        let stored = retriever
            .retrieve(url, dest)
            .and_then(|_| Ok(ContentHash::from_file(dest)?));
        match stored {
            Ok(hash) => {
                report.output_path = Some(dest.to_path_buf());
                report.content_hash = Some(hash.to_prefixed_hex());
            }
            Err(e) => report = report.with_error("download_failed", e.to_string()),
        }
        Ok(report)
    }

    fn elapsed_since(&self, start: Duration) -> Duration {
        self.clock.now().saturating_sub(start)
    }
}
