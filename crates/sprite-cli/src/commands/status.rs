//! `sprite status`: one status query for an existing task

use super::Context;
use crate::output::CommandOutcome;
use anyhow::{anyhow, Result};
use clap::Args;
use serde_json::{json, Value};
use sprite_gen::{create_service, PollStatus, Service, SpriteConfig};

fn parse_service(name: &str) -> std::result::Result<Service, String> {
    Service::from_name(name)
        .ok_or_else(|| format!("unknown service '{}'; valid values: liblib, tripo", name))
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Service the task runs on (liblib or tripo)
    #[arg(long, value_parser = parse_service)]
    pub service: Service,

    /// Remote task identifier
    #[arg(long)]
    pub task_id: String,

    /// API key for tripo, overriding environment and config
    #[arg(long)]
    pub tripo_key: Option<String>,
}

/// The status document for one poll result. `ok` is false for failed or errored tasks.
pub fn status_body(service: Service, task_id: &str, status: &PollStatus) -> (bool, Value) {
    let mut body = json!({
        "service": service.name(),
        "task_id": task_id,
        "status": status.label(),
    });
    let ok = match status {
        PollStatus::Processing { progress } => {
            if let Some(p) = progress {
                body["progress"] = json!(p);
            }
            true
        }
        PollStatus::Success { artifact_url } => {
            body["artifact_url"] = json!(artifact_url);
            true
        }
        PollStatus::Failed { error } | PollStatus::Error { error } => {
            body["error"] = json!(error);
            false
        }
    };
    (ok, body)
}

pub fn run(args: StatusArgs, ctx: &Context) -> Result<CommandOutcome> {
    let config =
        SpriteConfig::load(ctx.config.as_deref())?.with_tripo_key(args.tripo_key.as_deref());
    let service = create_service(args.service, &config)?;
    if args.task_id.trim().is_empty() {
        return Err(anyhow!("--task-id must not be empty"));
    }

    let status = service.poll(&args.task_id);
    log::info!("{} task {}: {}", args.service, args.task_id, status.label());
    let (ok, body) = status_body(args.service, &args.task_id, &status);
    CommandOutcome::new(ok, &body)
}
