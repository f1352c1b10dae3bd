//! Sprite CLI - AI asset generation from the command line
//!
//! Every invocation prints exactly one JSON document on stdout. Progress logs
//! go to stderr.

mod commands;
mod output;
mod resize;

use clap::{Parser, Subcommand};
use commands::{batch, model, status, ui, Context};
use output::CommandOutcome;
use sprite_gen::CancelFlag;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sprite")]
#[command(about = "AI asset generation: LiblibAI UI images and Tripo3D models", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file layered over ~/.sprite/config.toml and .sprite/config.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a single UI image via LiblibAI
    Ui(ui::UiArgs),

    /// Generate a 3D model via Tripo3D
    Model(model::ModelArgs),

    /// Batch generate UI images from a plan file
    Batch(batch::BatchArgs),

    /// Query a remote task once
    Status(status::StatusArgs),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Ui(_) => "ui",
            Commands::Model(_) => "model",
            Commands::Batch(_) => "batch",
            Commands::Status(_) => "status",
        }
    }
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .target(env_logger::Target::Stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let cancel = CancelFlag::new();
    let handler_flag = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        log::warn!("Interrupted");
        handler_flag.cancel();
    }) {
        log::warn!("Could not install Ctrl-C handler: {}", e);
    }

    let ctx = Context {
        config: cli.config,
        cancel,
    };
    let name = cli.command.name();
    let result = match cli.command {
        Commands::Ui(args) => ui::run(args, &ctx),
        Commands::Model(args) => model::run(args, &ctx),
        Commands::Batch(args) => batch::run(args, &ctx),
        Commands::Status(args) => status::run(args, &ctx),
    };

    let outcome = CommandOutcome::from_result(result);
    if let Err(e) = output::emit(name, &outcome) {
        log::error!("Failed to write result: {}", e);
    }
    std::process::exit(outcome.exit_code());
}
