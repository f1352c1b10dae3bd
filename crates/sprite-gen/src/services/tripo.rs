//! Tripo3D model generation service
//!
//! `POST /task` creates a text_to_model or image_to_model task; `GET /task/{id}`
//! reports its status. Authentication is a bearer token, no signing.

use crate::config::SpriteConfig;
use crate::extract::{TRIPO_ERROR, TRIPO_MODEL_URL, TRIPO_TASK_ID};
use crate::http::{HttpClient, HttpReply};
use crate::service::{is_ok_code, PollStatus, Service, TaskInput, TaskRequest, TaskService};
use crate::signing::{Credentials, RequestSigner};
use serde_json::{json, Value};
use sprite_core::{Result, SpriteError};
use std::time::Duration;

pub const TASK_PATH: &str = "/task";

/// Status path for `task_id`. Ids are used as one raw path segment, so only
/// URL-unreserved characters are accepted.
pub fn task_path(task_id: &str) -> Result<String> {
    let id = task_id.trim();
    let unreserved = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~');
    if id.is_empty() || id == "." || id == ".." || !id.chars().all(unreserved) {
        return Err(SpriteError::ConfigurationError(format!(
            "invalid task id: {:?}",
            task_id
        )));
    }
    Ok(format!("{}/{}", TASK_PATH, id))
}

/// Bearer-token 3D model service
pub struct TripoService {
    signer: RequestSigner,
    http: HttpClient,
}

impl TripoService {
    /// Create a TripoService from config
    pub fn from_config(config: &SpriteConfig) -> Result<Self> {
        let credentials = config.model_credentials()?;
        Ok(Self::new(
            config.tripo_url(),
            credentials,
            config.defaults.request_timeout,
        ))
    }

    pub fn new(base_url: &str, credentials: Credentials, timeout: Duration) -> Self {
        Self {
            signer: RequestSigner::new(base_url, credentials),
            http: HttpClient::new(timeout),
        }
    }
}

impl TaskService for TripoService {
    fn service(&self) -> Service {
        Service::Model
    }

    fn submit(&self, request: &TaskRequest) -> Result<String> {
        let signed = self.signer.post(TASK_PATH, create_payload(request)?)?;
        let reply = self.http.send(&signed)?;
        parse_create_response(&reply)
    }

    fn poll(&self, task_id: &str) -> PollStatus {
        let signed = match task_path(task_id).and_then(|path| self.signer.get(&path)) {
            Ok(s) => s,
            Err(e) => return PollStatus::Error { error: e.to_string() },
        };
        match self.http.send(&signed) {
            Ok(reply) if reply.is_success() => parse_task_response(&reply.body),
            Ok(reply) => PollStatus::Error {
                error: format!("HTTP {}: {}", reply.status, reply.body),
            },
            Err(e) => PollStatus::Error { error: e.to_string() },
        }
    }
}

/// Build the task creation body
pub fn create_payload(request: &TaskRequest) -> Result<Value> {
    let (kind, field, value) = match &request.input {
        TaskInput::Prompt(p) => ("text_to_model", "prompt", p),
        TaskInput::ImageUrl(u) => ("image_to_model", "image_url", u),
    };
    if value.trim().is_empty() {
        return Err(SpriteError::ConfigurationError(format!(
            "{} requires a non-empty {}",
            kind, field
        )));
    }

    let mut payload = json!({ "type": kind });
    payload[field] = json!(value);
    Ok(payload)
}

/// Parse a task creation reply into a task id
pub fn parse_create_response(reply: &HttpReply) -> Result<String> {
    let rejected = || SpriteError::SubmissionError(reply.body.clone());

    if !reply.is_success() {
        return Err(rejected());
    }
    let response = reply.json().ok_or_else(rejected)?;
    if let Some(code) = response.get("code") {
        if !is_ok_code(code) {
            return Err(rejected());
        }
    }
    TRIPO_TASK_ID.first_match(&response).ok_or_else(rejected)
}

/// Interpret a task status reply body
pub fn parse_task_response(body: &str) -> PollStatus {
    let response: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => {
            return PollStatus::Error {
                error: format!("invalid response: {}", body),
            }
        }
    };

    if let Some(code) = response.get("code") {
        if !is_ok_code(code) {
            return PollStatus::Error {
                error: TRIPO_ERROR
                    .first_match(&response)
                    .unwrap_or_else(|| format!("invalid response: {}", body)),
            };
        }
    }

    let task = match response.get("data") {
        Some(data) if data.is_object() => data,
        _ => &response,
    };

    let status = task
        .get("status")
        .and_then(|s| s.as_str())
        .unwrap_or_default()
        .to_lowercase();

    match status.as_str() {
        "success" => match TRIPO_MODEL_URL.first_match(task) {
            Some(artifact_url) => PollStatus::Success { artifact_url },
            None => PollStatus::Failed {
                error: "task succeeded but returned no model url".to_string(),
            },
        },
        "failed" | "cancelled" | "banned" | "expired" => PollStatus::Failed {
            error: TRIPO_ERROR
                .first_match(task)
                .unwrap_or_else(|| format!("task {}", status)),
        },
        _ => PollStatus::Processing {
            progress: task
                .get("progress")
                .and_then(|p| p.as_u64())
                .map(|p| p.min(100) as u8),
        },
    }
}
