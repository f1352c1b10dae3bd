//! Ordered field extraction over loosely-typed JSON responses
//!
//! The remote services report the same logical value (task id, artifact URL,
//! error text) under several field names and nesting shapes. Each value is
//! described by a `FieldRules` list of JSON pointers tried in priority order;
//! the first non-empty candidate wins.

use serde_json::Value;

/// An ordered list of JSON pointer candidates
#[derive(Debug, Clone, Copy)]
pub struct FieldRules(pub &'static [&'static str]);

impl FieldRules {
    /// Return the first candidate that resolves to a non-empty string.
    ///
    /// A candidate that resolves to an object is unwrapped one level through
    /// its `url` field. Numbers are accepted and rendered as strings.
    pub fn first_match(&self, value: &Value) -> Option<String> {
        self.0
            .iter()
            .filter_map(|pointer| value.pointer(pointer))
            .find_map(as_text)
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => match map.get("url") {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        },
        _ => None,
    }
}

/// Image service: task id returned by text2img
pub const LIBLIB_TASK_ID: FieldRules = FieldRules(&["/data/generateUuid", "/data/generate_uuid"]);

/// Image service: first generated image
pub const LIBLIB_IMAGE_URL: FieldRules = FieldRules(&[
    "/data/images/0/imageUrl",
    "/data/images/0/image_url",
    "/data/images/0",
]);

/// Image service: failure reason on a failed task
pub const LIBLIB_ERROR: FieldRules =
    FieldRules(&["/data/failReason", "/data/message", "/msg", "/message"]);

/// Model service: task id returned by task creation
pub const TRIPO_TASK_ID: FieldRules = FieldRules(&["/data/task_id", "/task_id"]);

/// Model service: artifact URL, relative to the task object
pub const TRIPO_MODEL_URL: FieldRules = FieldRules(&[
    "/output/model",
    "/output/model_mesh",
    "/output/pbr_model",
    "/result/pbr_model",
    "/result/model",
]);

/// Model service: error text, relative to the task object or the envelope
pub const TRIPO_ERROR: FieldRules =
    FieldRules(&["/error", "/error_msg", "/message", "/suggestion"]);
