//! Scripted doubles for the service, clock and retriever seams

use crate::clock::{CancelFlag, Clock};
use crate::retrieve::ArtifactRetriever;
use crate::service::{PollStatus, Service, TaskRequest, TaskService};
use sprite_core::{Result, SpriteError};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Scripted reply to one submission
#[derive(Debug, Clone)]
pub enum Submit {
    Accept(&'static str),
    Reject(&'static str),
    Unreachable,
    /// Refused before any request goes out
    Misconfigured(&'static str),
}

/// A service that replays scripted submissions and polls.
///
/// When a script runs out, its last entry repeats.
pub struct ScriptedService {
    service: Service,
    submits: RefCell<VecDeque<Submit>>,
    polls: RefCell<VecDeque<PollStatus>>,
    /// Every call in order: `submit:<prompt>` or `poll:<task id>`
    pub calls: RefCell<Vec<String>>,
}

impl ScriptedService {
    pub fn new(submits: Vec<Submit>, polls: Vec<PollStatus>) -> Self {
        Self {
            service: Service::Image,
            submits: RefCell::new(submits.into()),
            polls: RefCell::new(polls.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Accepts every submission as `gen-1`, then replays `polls`
    pub fn accepting(polls: Vec<PollStatus>) -> Self {
        Self::new(vec![Submit::Accept("gen-1")], polls)
    }

    pub fn submit_count(&self) -> usize {
        self.calls.borrow().iter().filter(|c| c.starts_with("submit")).count()
    }

    pub fn poll_count(&self) -> usize {
        self.calls.borrow().iter().filter(|c| c.starts_with("poll")).count()
    }

    fn next<T: Clone>(queue: &RefCell<VecDeque<T>>) -> Option<T> {
        let mut queue = queue.borrow_mut();
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl TaskService for ScriptedService {
    fn service(&self) -> Service {
        self.service
    }

    fn submit(&self, request: &TaskRequest) -> Result<String> {
        self.calls.borrow_mut().push(format!(
            "submit:{}",
            request.prompt_text().unwrap_or_default()
        ));
        match Self::next(&self.submits) {
            Some(Submit::Accept(id)) => Ok(id.to_string()),
            Some(Submit::Reject(body)) => Err(SpriteError::SubmissionError(body.to_string())),
            Some(Submit::Misconfigured(msg)) => {
                Err(SpriteError::ConfigurationError(msg.to_string()))
            }
            Some(Submit::Unreachable) | None => {
                Err(SpriteError::NetworkError("connection refused".to_string()))
            }
        }
    }

    fn poll(&self, task_id: &str) -> PollStatus {
        self.calls.borrow_mut().push(format!("poll:{}", task_id));
        Self::next(&self.polls).unwrap_or(PollStatus::Processing { progress: None })
    }
}

/// A clock that only advances when slept on
#[derive(Default)]
pub struct ManualClock {
    now: Cell<Duration>,
    pub sleeps: RefCell<Vec<Duration>>,
    cancel_after: Option<(usize, CancelFlag)>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `flag` when the `n`th sleep returns, as a Ctrl-C during that sleep would
    pub fn cancelling_after(n: usize, flag: &CancelFlag) -> Self {
        Self {
            cancel_after: Some((n, flag.clone())),
            ..Self::default()
        }
    }

    pub fn sleep_count(&self) -> usize {
        self.sleeps.borrow().len()
    }

    /// Sleeps of exactly `duration`
    pub fn sleeps_of(&self, duration: Duration) -> usize {
        self.sleeps.borrow().iter().filter(|d| **d == duration).count()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
        self.sleeps.borrow_mut().push(duration);
        if let Some((n, flag)) = &self.cancel_after {
            if self.sleeps.borrow().len() >= *n {
                flag.cancel();
            }
        }
    }
}

/// Writes the URL text as the artifact body and records every call
#[derive(Default)]
pub struct RecordingRetriever {
    pub downloads: RefCell<Vec<(String, PathBuf)>>,
    failures_left: Cell<u32>,
}

impl RecordingRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the first `n` downloads with a 503
    pub fn failing_first(n: u32) -> Self {
        Self {
            failures_left: Cell::new(n),
            ..Self::default()
        }
    }
}

impl ArtifactRetriever for RecordingRetriever {
    fn retrieve(&self, url: &str, dest: &Path) -> Result<u64> {
        self.downloads
            .borrow_mut()
            .push((url.to_string(), dest.to_path_buf()));
        if self.failures_left.get() > 0 {
            self.failures_left.set(self.failures_left.get() - 1);
            return Err(SpriteError::DownloadError {
                url: url.to_string(),
                cause: "HTTP 503".to_string(),
            });
        }
        crate::retrieve::write_atomically(dest, url.as_bytes())
    }
}

pub fn temp_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("sprite_{}_{}", label, uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
