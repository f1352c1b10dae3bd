//! `sprite batch`: run a plan of UI images sequentially

use super::{secs_or, Context};
use crate::output::CommandOutcome;
use crate::resize::ImageResizer;
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use sprite_gen::config::Defaults;
use sprite_gen::services::liblib::LiblibService;
use sprite_gen::{
    BatchOptions, BatchOrchestrator, BatchPlan, HttpRetriever, PlanFile, PlannedItem, PollTiming,
    RetryPolicy, SpriteConfig, SystemClock,
};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Plan file (JSON, or TOML by extension)
    #[arg(short, long)]
    pub spec: PathBuf,

    /// Root directory for outputs, overriding the plan
    #[arg(long)]
    pub output_root: Option<PathBuf>,

    /// Style prefix, overriding the plan
    #[arg(long)]
    pub style_prefix: Option<String>,

    /// Seconds to wait before each item after the first
    #[arg(long)]
    pub submit_delay: Option<u64>,

    /// Attempts per item
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Seconds to wait between attempts
    #[arg(long)]
    pub retry_delay: Option<u64>,

    /// Per-task deadline in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Seconds between status queries
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Skip items whose output file already exists
    #[arg(long)]
    pub skip_existing: bool,

    /// Print what would be generated without calling the service
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Serialize)]
struct DryRun<'a> {
    dry_run: bool,
    total: usize,
    style_prefix: &'a str,
    output_root: &'a PathBuf,
    items: Vec<PlannedItem>,
}

impl BatchArgs {
    fn options(&self, defaults: &Defaults) -> BatchOptions {
        BatchOptions {
            skip_existing: self.skip_existing,
            retry: RetryPolicy {
                max_retries: self.max_retries.unwrap_or(defaults.max_retries),
                retry_delay: secs_or(self.retry_delay, defaults.retry_delay),
                submit_delay: secs_or(self.submit_delay, defaults.submit_delay),
            },
        }
    }

    fn timing(&self, defaults: &Defaults) -> PollTiming {
        PollTiming::new(
            secs_or(self.poll_interval, defaults.poll_interval),
            secs_or(self.timeout, defaults.timeout),
        )
    }
}

fn dry_run(plan: &BatchPlan) -> Result<CommandOutcome> {
    CommandOutcome::new(
        true,
        &DryRun {
            dry_run: true,
            total: plan.items.len(),
            style_prefix: &plan.style_prefix,
            output_root: &plan.output_root,
            items: plan.preview(),
        },
    )
}

pub fn run(args: BatchArgs, ctx: &Context) -> Result<CommandOutcome> {
    let config = SpriteConfig::load(ctx.config.as_deref())?;
    let plan = PlanFile::load(&args.spec)?.resolve(
        args.style_prefix.clone(),
        args.output_root.clone(),
        &config.defaults.style_prefix,
    )?;

    if args.dry_run {
        return dry_run(&plan);
    }

    let service = LiblibService::from_config(&config)?;
    let retriever = HttpRetriever::new(config.defaults.download_timeout);
    let clock = SystemClock::interruptible(&ctx.cancel);
    let orchestrator = BatchOrchestrator::new(
        &service,
        &retriever,
        &clock,
        &ctx.cancel,
        args.timing(&config.defaults),
        args.options(&config.defaults),
    )
    .with_post_process(&ImageResizer);

    let run = orchestrator.run(&plan);
    let outcome = CommandOutcome::new(run.ok(), &run)?;
    Ok(if run.cancelled {
        outcome.interrupted()
    } else {
        outcome
    })
}
