//! CLI command implementations

pub mod batch;
pub mod model;
pub mod status;
pub mod ui;

use sprite_gen::CancelFlag;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Shared state for every command
pub struct Context {
    pub config: Option<PathBuf>,
    pub cancel: CancelFlag,
}

const DEFAULT_OUTPUT_DIR: &str = "output";

/// `output/<prefix>_<YYYYmmdd_HHMMSS>.<ext>`
pub(crate) fn default_output_path(prefix: &str, ext: &str) -> PathBuf {
    let ts = chrono::Local::now().format("%Y%m%d_%H%M%S");
    Path::new(DEFAULT_OUTPUT_DIR).join(format!("{}_{}.{}", prefix, ts, ext))
}

/// A flag given in whole seconds, or the configured default
pub(crate) fn secs_or(flag: Option<u64>, default: Duration) -> Duration {
    flag.map(Duration::from_secs).unwrap_or(default)
}

pub(crate) fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
