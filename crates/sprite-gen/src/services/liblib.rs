//! LiblibAI image generation service
//!
//! Every call is a signed POST: `text2img` creates a task and returns a
//! `generateUuid`, `status` reports `generateStatus` plus the image list.

use crate::config::SpriteConfig;
use crate::extract::{LIBLIB_ERROR, LIBLIB_IMAGE_URL, LIBLIB_TASK_ID};
use crate::http::{HttpClient, HttpReply};
use crate::service::{is_ok_code, PollStatus, Service, TaskInput, TaskRequest, TaskService};
use crate::signing::{Credentials, RequestSigner};
use serde_json::{json, Value};
use sprite_core::{Result, SpriteError};
use std::time::Duration;

pub const TEXT2IMG_PATH: &str = "/api/generate/webui/text2img";
pub const STATUS_PATH: &str = "/api/generate/webui/status";

const DEFAULT_STEPS: u32 = 20;
const DEFAULT_WIDTH: u32 = 768;
const DEFAULT_HEIGHT: u32 = 1344;
const DEFAULT_IMG_COUNT: u32 = 1;
const DEFAULT_SEED: i64 = -1;

/// Key-pair signed image service
pub struct LiblibService {
    signer: RequestSigner,
    http: HttpClient,
    template_uuid: String,
}

impl LiblibService {
    /// Create a LiblibService from config
    pub fn from_config(config: &SpriteConfig) -> Result<Self> {
        let credentials = config.image_credentials()?;
        Ok(Self::new(
            config.liblib_url(),
            credentials,
            config.template_uuid(),
            config.defaults.request_timeout,
        ))
    }

    pub fn new(
        base_url: &str,
        credentials: Credentials,
        template_uuid: &str,
        timeout: Duration,
    ) -> Self {
        Self {
            signer: RequestSigner::new(base_url, credentials),
            http: HttpClient::new(timeout),
            template_uuid: template_uuid.to_string(),
        }
    }
}

impl TaskService for LiblibService {
    fn service(&self) -> Service {
        Service::Image
    }

    fn submit(&self, request: &TaskRequest) -> Result<String> {
        let payload = text2img_payload(request, &self.template_uuid)?;
        let signed = self.signer.post(TEXT2IMG_PATH, payload)?;
        let reply = self.http.send(&signed)?;
        parse_submit_response(&reply)
    }

    fn poll(&self, task_id: &str) -> PollStatus {
        let signed = match self.signer.post(STATUS_PATH, json!({ "generateUuid": task_id })) {
            Ok(s) => s,
            Err(e) => return PollStatus::Error { error: e.to_string() },
        };
        match self.http.send(&signed) {
            Ok(reply) if reply.is_success() => parse_status_response(&reply.body),
            Ok(reply) => PollStatus::Error {
                error: format!("HTTP {}: {}", reply.status, reply.body),
            },
            Err(e) => PollStatus::Error { error: e.to_string() },
        }
    }
}

/// Build the text2img request body
pub fn text2img_payload(request: &TaskRequest, default_template: &str) -> Result<Value> {
    let prompt = match &request.input {
        TaskInput::Prompt(p) => p,
        TaskInput::ImageUrl(_) => {
            return Err(SpriteError::ConfigurationError(
                "The image service generates from a prompt, not an image reference".to_string(),
            ))
        }
    };
    let p = &request.params;

    Ok(json!({
        "templateUuid": p.template_uuid.as_deref().unwrap_or(default_template),
        "generateParams": {
            "prompt": prompt,
            "steps": p.steps.unwrap_or(DEFAULT_STEPS),
            "width": p.width.unwrap_or(DEFAULT_WIDTH),
            "height": p.height.unwrap_or(DEFAULT_HEIGHT),
            "imgCount": p.img_count.unwrap_or(DEFAULT_IMG_COUNT),
            "seed": p.seed.unwrap_or(DEFAULT_SEED),
            "restoreFaces": 0
        }
    }))
}

/// Parse a text2img reply into a task id
pub fn parse_submit_response(reply: &HttpReply) -> Result<String> {
    let rejected = || SpriteError::SubmissionError(reply.body.clone());

    if !reply.is_success() {
        return Err(rejected());
    }
    let response = reply.json().ok_or_else(rejected)?;
    let code_ok = response.get("code").map(is_ok_code).unwrap_or(false);
    if !code_ok {
        return Err(rejected());
    }
    LIBLIB_TASK_ID.first_match(&response).ok_or_else(rejected)
}

#[derive(Debug, PartialEq, Eq)]
enum Phase {
    Succeeded,
    Failed,
    Running,
}

fn classify(status: Option<&Value>) -> Phase {
    match status {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(5) => Phase::Succeeded,
            Some(4) | Some(-1) => Phase::Failed,
            _ => Phase::Running,
        },
        Some(Value::String(s)) => match s.trim() {
            "SUCCEED" | "SUCCESS" | "5" => Phase::Succeeded,
            "FAILED" | "4" | "-1" => Phase::Failed,
            _ => Phase::Running,
        },
        _ => Phase::Running,
    }
}

/// Interpret a status reply body
pub fn parse_status_response(body: &str) -> PollStatus {
    let response: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => {
            return PollStatus::Error {
                error: format!("invalid response: {}", body),
            }
        }
    };

    let code_ok = response.get("code").map(is_ok_code).unwrap_or(false);
    if !code_ok {
        return PollStatus::Error {
            error: format!("invalid response: {}", body),
        };
    }

    let data = response.get("data");
    let status = data.and_then(|d| d.get("generateStatus").or_else(|| d.get("status")));

    match classify(status) {
        Phase::Succeeded => match LIBLIB_IMAGE_URL.first_match(&response) {
            Some(artifact_url) => PollStatus::Success { artifact_url },
            None => PollStatus::Failed {
                error: "task succeeded but returned no image url".to_string(),
            },
        },
        Phase::Failed => PollStatus::Failed {
            error: LIBLIB_ERROR
                .first_match(&response)
                .unwrap_or_else(|| "unknown failure".to_string()),
        },
        Phase::Running => PollStatus::Processing {
            progress: data
                .and_then(|d| d.get("percentCompleted"))
                .and_then(|p| p.as_f64())
                .map(|p| (p * 100.0).clamp(0.0, 100.0) as u8),
        },
    }
}
