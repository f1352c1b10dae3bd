//! Task service trait and request/status types

use serde::{Deserialize, Serialize};
use sprite_core::Result;
use std::fmt;

/// The remote service a task runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Service {
    /// Key-pair signed image generation (LiblibAI)
    #[serde(rename = "liblib")]
    Image,
    /// Bearer-token 3D model generation (Tripo3D)
    #[serde(rename = "tripo")]
    Model,
}

impl Service {
    pub fn name(&self) -> &'static str {
        match self {
            Service::Image => "liblib",
            Service::Model => "tripo",
        }
    }

    /// Parse a service name as used on the command line
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "liblib" | "image" => Some(Service::Image),
            "tripo" | "model" => Some(Service::Model),
            _ => None,
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the remote service should generate from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskInput {
    /// Generate from prompt text
    Prompt(String),
    /// Generate from a source image reference
    ImageUrl(String),
}

/// Pass-through generation parameters. Unset fields use the service defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationParams {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub steps: Option<u32>,
    #[serde(default)]
    pub seed: Option<i64>,
    #[serde(default)]
    pub img_count: Option<u32>,
    #[serde(default)]
    pub template_uuid: Option<String>,
}

/// A request to create one generation task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRequest {
    pub input: TaskInput,
    #[serde(default)]
    pub params: GenerationParams,
}

impl TaskRequest {
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self {
            input: TaskInput::Prompt(prompt.into()),
            params: GenerationParams::default(),
        }
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self {
            input: TaskInput::ImageUrl(url.into()),
            params: GenerationParams::default(),
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// The prompt text, if this is a prompt-driven request
    pub fn prompt_text(&self) -> Option<&str> {
        match &self.input {
            TaskInput::Prompt(p) => Some(p),
            TaskInput::ImageUrl(_) => None,
        }
    }
}

/// `prefix, text`, or the text alone when the prefix is empty
pub fn styled_prompt(style_prefix: &str, text: &str) -> String {
    if style_prefix.is_empty() {
        text.to_string()
    } else {
        format!("{}, {}", style_prefix, text)
    }
}

/// Result of one status query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    /// Still running, with progress percentage (0-100) when the service reports one
    Processing { progress: Option<u8> },
    /// Finished; the artifact can be fetched from `artifact_url`
    Success { artifact_url: String },
    /// The service confirmed the job failed
    Failed { error: String },
    /// We could not reach the service or could not interpret its answer
    Error { error: String },
}

impl PollStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollStatus::Processing { .. })
    }

    /// Short label used in logs and status output
    pub fn label(&self) -> &'static str {
        match self {
            PollStatus::Processing { .. } => "processing",
            PollStatus::Success { .. } => "success",
            PollStatus::Failed { .. } => "failed",
            PollStatus::Error { .. } => "error",
        }
    }
}

/// Trait implemented by each remote generation service
pub trait TaskService: Send {
    /// Which service this is
    fn service(&self) -> Service;

    /// Create a task and return its remote identifier.
    ///
    /// Fails with `SubmissionError` when the service rejects the request and
    /// `NetworkError` when it cannot be reached. Never retries.
    fn submit(&self, request: &TaskRequest) -> Result<String>;

    /// Perform exactly one status query
    fn poll(&self, task_id: &str) -> PollStatus;
}

/// Accept `0` or `"0"` as an ok response code
pub(crate) fn is_ok_code(code: &serde_json::Value) -> bool {
    match code {
        serde_json::Value::Number(n) => n.as_i64() == Some(0),
        serde_json::Value::String(s) => s.trim() == "0",
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_styled_prompt() {
        assert_eq!(styled_prompt("WoW style", "gold frame"), "WoW style, gold frame");
        assert_eq!(styled_prompt("", "gold frame"), "gold frame");
    }

    #[test]
    fn test_service_names() {
        assert_eq!(Service::Image.to_string(), "liblib");
        assert_eq!(Service::from_name("tripo"), Some(Service::Model));
        assert_eq!(Service::from_name("midjourney"), None);
        assert_eq!(serde_json::to_value(Service::Image).unwrap(), json!("liblib"));
    }

    #[test]
    fn test_ok_code() {
        assert!(is_ok_code(&json!(0)));
        assert!(is_ok_code(&json!("0")));
        assert!(!is_ok_code(&json!(1)));
        assert!(!is_ok_code(&json!(null)));
    }

    #[test]
    fn test_poll_status_terminal() {
        assert!(!PollStatus::Processing { progress: Some(40) }.is_terminal());
        assert!(PollStatus::Error { error: "dns".into() }.is_terminal());
        assert_eq!(
            PollStatus::Success {
                artifact_url: "u".into()
            }
            .label(),
            "success"
        );
    }
}
