//! `sprite model`: one 3D model from Tripo3D

use super::{absolute, default_output_path, secs_or, Context};
use crate::output::CommandOutcome;
use anyhow::{bail, Result};
use clap::{Args, ValueEnum};
use sprite_gen::services::tripo::TripoService;
use sprite_gen::{
    ArtifactRetriever, HttpRetriever, PollTiming, SpriteConfig, SystemClock, TaskRequest,
    TaskRunner,
};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum ModelKind {
    TextToModel,
    ImageToModel,
}

impl ModelKind {
    fn name(&self) -> &'static str {
        match self {
            ModelKind::TextToModel => "text_to_model",
            ModelKind::ImageToModel => "image_to_model",
        }
    }
}

#[derive(Args, Debug)]
pub struct ModelArgs {
    /// Generation type
    #[arg(long = "type", value_enum, default_value = "text_to_model")]
    pub kind: ModelKind,

    /// Prompt text (text_to_model)
    #[arg(long)]
    pub prompt: Option<String>,

    /// Source image URL (image_to_model)
    #[arg(long)]
    pub image_url: Option<String>,

    /// Output path (defaults to output/model_<timestamp>.glb)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Overall deadline in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Seconds between status queries
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// API key, overriding environment and config
    #[arg(long)]
    pub tripo_key: Option<String>,

    /// Only report the model URL
    #[arg(long)]
    pub no_download: bool,
}

/// Build the request for the chosen generation type
pub fn model_request(
    kind: ModelKind,
    prompt: Option<&str>,
    image_url: Option<&str>,
) -> Result<TaskRequest> {
    let present = |v: Option<&str>| {
        v.map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    match kind {
        ModelKind::TextToModel => match present(prompt) {
            Some(p) => Ok(TaskRequest::prompt(p)),
            None => bail!("text_to_model requires --prompt"),
        },
        ModelKind::ImageToModel => match present(image_url) {
            Some(u) => Ok(TaskRequest::image(u)),
            None => bail!("image_to_model requires --image-url"),
        },
    }
}

pub fn run(args: ModelArgs, ctx: &Context) -> Result<CommandOutcome> {
    let config =
        SpriteConfig::load(ctx.config.as_deref())?.with_tripo_key(args.tripo_key.as_deref());
    let service = TripoService::from_config(&config)?;
    let request = model_request(args.kind, args.prompt.as_deref(), args.image_url.as_deref())?;

    let timing = PollTiming::new(
        secs_or(args.poll_interval, config.defaults.poll_interval),
        secs_or(args.timeout, config.defaults.model_timeout),
    );
    let clock = SystemClock::interruptible(&ctx.cancel);
    let runner = TaskRunner::new(&service, &clock, &ctx.cancel, timing);
    let retriever = HttpRetriever::new(config.defaults.download_timeout);
    let dest = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path("model", "glb"));

    log::info!("Generating 3D model ({})...", args.kind.name());
    let download = if args.no_download {
        None
    } else {
        Some((&retriever as &dyn ArtifactRetriever, dest.as_path()))
    };
    let mut report = runner.run_single(&request, download)?;
    report.output_path = report.output_path.as_deref().map(absolute);

    let mut outcome = CommandOutcome::new(report.ok, &report)?;
    outcome.insert("type", args.kind.name());
    Ok(outcome)
}
