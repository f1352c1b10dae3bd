//! Lifecycle tracking for one remote generation task

use crate::service::Service;
use serde::{Deserialize, Serialize};
use sprite_core::SpriteError;
use std::path::PathBuf;

/// State of a generation task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Submitting,
    Processing,
    Succeeded,
    Failed,
    TimedOut,
    SubmitFailed,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskState::Submitting | TaskState::Processing)
    }

    /// Whether the lifecycle allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        use TaskState::*;
        matches!(
            (self, next),
            (Submitting, Processing)
                | (Submitting, SubmitFailed)
                | (Processing, Processing)
                | (Processing, Succeeded)
                | (Processing, Failed)
                | (Processing, TimedOut)
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskState::Submitting => "submitting",
            TaskState::Processing => "processing",
            TaskState::Succeeded => "success",
            TaskState::Failed => "failed",
            TaskState::TimedOut => "timeout",
            TaskState::SubmitFailed => "submit_failed",
        }
    }
}

/// One remote job, owned by the loop that drives it
#[derive(Debug)]
pub struct GenerationTask {
    pub service: Service,
    /// Remote identifier, unset until submission succeeds
    pub task_id: Option<String>,
    pub state: TaskState,
    /// Set only on entering `Succeeded`
    pub artifact_url: Option<String>,
    /// Set on `SubmitFailed`, `Failed` or `TimedOut`
    pub error_detail: Option<String>,
    /// The submitter's own error, kept so callers see its real kind
    submit_error: Option<SpriteError>,
    pub elapsed_seconds: f64,
    /// Number of status queries issued
    pub polls: u32,
}

impl GenerationTask {
    pub fn new(service: Service) -> Self {
        Self {
            service,
            task_id: None,
            state: TaskState::Submitting,
            artifact_url: None,
            error_detail: None,
            submit_error: None,
            elapsed_seconds: 0.0,
            polls: 0,
        }
    }

    /// Submission accepted
    pub fn accept(&mut self, task_id: String) {
        if self.advance(TaskState::Processing) {
            self.task_id = Some(task_id);
        }
    }

    /// Submission rejected, unreachable or refused locally
    pub fn reject(&mut self, error: SpriteError) {
        if self.advance(TaskState::SubmitFailed) {
            self.error_detail = Some(error.to_string());
            self.submit_error = Some(error);
        }
    }

    pub fn succeed(&mut self, artifact_url: String) {
        if self.advance(TaskState::Succeeded) {
            self.artifact_url = Some(artifact_url);
        }
    }

    pub fn fail(&mut self, error: String) {
        if self.advance(TaskState::Failed) {
            self.error_detail = Some(error);
        }
    }

    pub fn time_out(&mut self, error: String) {
        if self.advance(TaskState::TimedOut) {
            self.error_detail = Some(error);
        }
    }

    /// Move to `next` if the lifecycle allows it. Terminal states never change.
    fn advance(&mut self, next: TaskState) -> bool {
        if self.state.can_transition_to(next) {
            self.state = next;
            true
        } else {
            log::debug!(
                "ignoring transition {} -> {} for {} task",
                self.state.label(),
                next.label(),
                self.service
            );
            false
        }
    }

    pub fn is_succeeded(&self) -> bool {
        self.state == TaskState::Succeeded
    }

    /// Take the typed error of a finished, unsuccessful task.
    ///
    /// A failed submission yields the submitter's error unchanged, so a
    /// configuration problem stays fatal and a transport problem keeps its label.
    pub fn take_failure(&mut self) -> Option<SpriteError> {
        let detail = self.error_text();
        match self.state {
            TaskState::SubmitFailed => Some(
                self.submit_error
                    .take()
                    .unwrap_or(SpriteError::SubmissionError(detail)),
            ),
            TaskState::Failed => Some(SpriteError::RemoteFailure(detail)),
            TaskState::TimedOut => Some(SpriteError::TimedOut(detail)),
            _ => None,
        }
    }

    /// The error text of a finished, unsuccessful task
    pub fn error_text(&self) -> String {
        self.error_detail
            .clone()
            .unwrap_or_else(|| format!("task ended in state {}", self.state.label()))
    }
}

/// Machine-readable record of one single-task invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskReport {
    pub ok: bool,
    pub service: Service,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_seconds: f64,
}

impl TaskReport {
    /// Report a finished task before any download
    pub fn from_task(task: &GenerationTask) -> Self {
        let ok = task.is_succeeded();
        Self {
            ok,
            service: task.service,
            status: task.state.label().to_string(),
            task_id: task.task_id.clone(),
            artifact_url: task.artifact_url.clone(),
            output_path: None,
            content_hash: None,
            error: if ok { None } else { Some(task.error_text()) },
            elapsed_seconds: round_secs(task.elapsed_seconds),
        }
    }

    /// Mark a successful task as failed after the fact (download or post-processing)
    pub fn with_error(mut self, status: &str, error: String) -> Self {
        self.ok = false;
        self.status = status.to_string();
        self.error = Some(error);
        self
    }
}

/// Round to one decimal for output
pub(crate) fn round_secs(secs: f64) -> f64 {
    (secs * 10.0).round() / 10.0
}
