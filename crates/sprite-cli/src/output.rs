//! The single JSON result document written to stdout

use anyhow::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use sprite_core::SpriteError;

/// Exit code for an invocation stopped by Ctrl-C
pub const EXIT_INTERRUPTED: i32 = 130;

/// What a command produced, before the `ok`/`command` envelope is added
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub ok: bool,
    pub interrupted: bool,
    pub body: Map<String, Value>,
}

impl CommandOutcome {
    /// Wrap a serializable record. Non-object values land under `result`.
    pub fn new(ok: bool, body: &impl Serialize) -> Result<Self> {
        let body = match serde_json::to_value(body)? {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("result".to_string(), other);
                map
            }
        };
        Ok(Self {
            ok,
            interrupted: false,
            body,
        })
    }

    pub fn failure(error: String) -> Self {
        let mut body = Map::new();
        body.insert("error".to_string(), Value::String(error));
        Self {
            ok: false,
            interrupted: false,
            body,
        }
    }

    /// Mark as stopped by an interrupt; `ok` is always false afterwards
    pub fn interrupted(mut self) -> Self {
        self.ok = false;
        self.interrupted = true;
        self.body
            .entry("error")
            .or_insert_with(|| Value::String("interrupted".to_string()));
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.body.insert(key.to_string(), value.into());
    }

    /// Fold a command's error into a failure outcome
    pub fn from_result(result: Result<CommandOutcome>) -> Self {
        match result {
            Ok(outcome) => outcome,
            Err(e) => match e.downcast_ref::<SpriteError>() {
                Some(SpriteError::Cancelled) => {
                    Self::failure("interrupted".to_string()).interrupted()
                }
                _ => {
                    log::error!("{:#}", e);
                    Self::failure(format!("{:#}", e))
                }
            },
        }
    }

    pub fn exit_code(&self) -> i32 {
        if self.interrupted {
            EXIT_INTERRUPTED
        } else if self.ok {
            0
        } else {
            1
        }
    }

    /// The full document: `ok` and `command` followed by the body fields
    pub fn to_json(&self, command: &str) -> Value {
        let mut doc = Map::new();
        doc.insert("ok".to_string(), Value::Bool(self.ok));
        doc.insert("command".to_string(), Value::String(command.to_string()));
        for (k, v) in &self.body {
            if k != "ok" && k != "command" {
                doc.insert(k.clone(), v.clone());
            }
        }
        Value::Object(doc)
    }
}

/// Print the result document to stdout
pub fn emit(command: &str, outcome: &CommandOutcome) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&outcome.to_json(command))?);
    Ok(())
}
