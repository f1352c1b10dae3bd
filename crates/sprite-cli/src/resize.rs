//! Resize post-processing for downloaded UI images

use image::imageops::FilterType;
use sprite_core::{Result, SpriteError};
use sprite_gen::PostProcess;
use std::path::{Path, PathBuf};

/// Resizes to the exact target size with Lanczos3 and saves as RGBA PNG.
///
/// The result is written next to the input with a `.png` extension; when that
/// differs from the input path, the input is removed.
pub struct ImageResizer;

impl PostProcess for ImageResizer {
    fn process(&self, path: &Path, width: u32, height: u32) -> Result<PathBuf> {
        if width == 0 || height == 0 {
            return Err(SpriteError::PostProcessError(format!(
                "Invalid target size {}x{}",
                width, height
            )));
        }

        let img = image::open(path).map_err(|e| {
            SpriteError::PostProcessError(format!("Failed to open '{}': {}", path.display(), e))
        })?;
        let resized = image::imageops::resize(&img.to_rgba8(), width, height, FilterType::Lanczos3);

        let out_path = path.with_extension("png");
        resized.save(&out_path).map_err(|e| {
            SpriteError::PostProcessError(format!("Failed to save PNG: {}", e))
        })?;
        if out_path != path {
            std::fs::remove_file(path)?;
        }

        log::info!("Resized to {}x{}: {}", width, height, out_path.display());
        Ok(out_path)
    }
}
