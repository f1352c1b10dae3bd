//! `sprite ui`: one image from LiblibAI

use super::{absolute, default_output_path, secs_or, Context};
use crate::output::CommandOutcome;
use crate::resize::ImageResizer;
use anyhow::Result;
use clap::Args;
use sprite_core::ContentHash;
use sprite_gen::services::liblib::LiblibService;
use sprite_gen::{
    styled_prompt, ArtifactRetriever, GenerationParams, HttpRetriever, PollTiming, PostProcess,
    SpriteConfig, SystemClock, TaskRequest, TaskRunner,
};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct UiArgs {
    /// Prompt text, appended to the style prefix
    #[arg(long)]
    pub prompt: String,

    /// Resize the downloaded image to this width
    #[arg(long)]
    pub width: Option<u32>,

    /// Resize the downloaded image to this height
    #[arg(long)]
    pub height: Option<u32>,

    /// Output path (defaults to output/ui_<timestamp>.png)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Style prefix; pass "" to send the prompt alone
    #[arg(long)]
    pub style_prefix: Option<String>,

    /// Generation template (defaults to the configured template)
    #[arg(long)]
    pub template_uuid: Option<String>,

    #[arg(long, default_value = "20")]
    pub steps: u32,

    /// -1 lets the service pick
    #[arg(long, default_value = "-1", allow_hyphen_values = true)]
    pub seed: i64,

    #[arg(long, default_value = "1")]
    pub img_count: u32,

    /// Generation width sent to the service
    #[arg(long, default_value = "768")]
    pub gen_width: u32,

    /// Generation height sent to the service
    #[arg(long, default_value = "1344")]
    pub gen_height: u32,

    /// Overall deadline in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Seconds between status queries
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Keep the generated size
    #[arg(long)]
    pub no_resize: bool,

    /// Only report the image URL
    #[arg(long)]
    pub no_download: bool,
}

pub fn run(args: UiArgs, ctx: &Context) -> Result<CommandOutcome> {
    let config = SpriteConfig::load(ctx.config.as_deref())?;
    let service = LiblibService::from_config(&config)?;

    let prefix = args
        .style_prefix
        .clone()
        .unwrap_or_else(|| config.defaults.style_prefix.clone());
    let full_prompt = styled_prompt(&prefix, &args.prompt);
    let request = TaskRequest::prompt(full_prompt.clone()).with_params(GenerationParams {
        width: Some(args.gen_width),
        height: Some(args.gen_height),
        steps: Some(args.steps),
        seed: Some(args.seed),
        img_count: Some(args.img_count),
        template_uuid: args.template_uuid.clone(),
    });

    let timing = PollTiming::new(
        secs_or(args.poll_interval, config.defaults.poll_interval),
        secs_or(args.timeout, config.defaults.timeout),
    );
    let clock = SystemClock::interruptible(&ctx.cancel);
    let runner = TaskRunner::new(&service, &clock, &ctx.cancel, timing);
    let retriever = HttpRetriever::new(config.defaults.download_timeout);
    let dest = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path("ui", "png"));

    log::info!("Generating UI image...");
    log::info!("Prompt: {}", full_prompt);
    let download = if args.no_download {
        None
    } else {
        Some((&retriever as &dyn ArtifactRetriever, dest.as_path()))
    };
    let mut report = runner.run_single(&request, download)?;

    if let (true, Some(path), Some(w), Some(h)) =
        (report.ok && !args.no_resize, report.output_path.clone(), args.width, args.height)
    {
        let resized = ImageResizer
            .process(&path, w, h)
            .and_then(|out| Ok((ContentHash::from_file(&out)?, out)));
        match resized {
            Ok((hash, out)) => {
                report.output_path = Some(out);
                report.content_hash = Some(hash.to_prefixed_hex());
            }
            Err(e) => report = report.with_error("resize_failed", e.to_string()),
        }
    }
    report.output_path = report.output_path.as_deref().map(absolute);

    let mut outcome = CommandOutcome::new(report.ok, &report)?;
    outcome.insert("prompt", full_prompt);
    if let Some(w) = args.width {
        outcome.insert("width", w);
    }
    if let Some(h) = args.height {
        outcome.insert("height", h);
    }
    Ok(outcome)
}
