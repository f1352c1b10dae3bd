//! Batch plan loading and dry-run preview
//!
//! A plan file is JSON (or TOML, by extension) with an `items` list and
//! optional `style_prefix` and `output_root`:
//!
//! ```json
//! {
//!   "style_prefix": "World of Warcraft UI style",
//!   "output_root": "Assets/Resources/Sprites/UI",
//!   "items": [
//!     { "category": "Buttons", "filename": "btn_gold.png", "width": 256, "height": 64,
//!       "prompt": "ornate golden button" }
//!   ]
//! }
//! ```

use crate::batch::BatchItem;
use serde::{Deserialize, Serialize};
use sprite_core::{Result, SpriteError};
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_ROOT: &str = "output";
const PREVIEW_CHARS: usize = 120;

/// A plan file as written on disk
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanFile {
    #[serde(default)]
    pub style_prefix: Option<String>,
    #[serde(default)]
    pub output_root: Option<PathBuf>,
    #[serde(default)]
    pub items: Vec<BatchItem>,
}

impl PlanFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SpriteError::PlanError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        if is_toml {
            toml::from_str(&content).map_err(|e| {
                SpriteError::PlanError(format!("Failed to parse {}: {}", path.display(), e))
            })
        } else {
            serde_json::from_str(&content).map_err(|e| {
                SpriteError::PlanError(format!("Failed to parse {}: {}", path.display(), e))
            })
        }
    }

    /// Apply overrides and defaults. An empty item list is rejected.
    ///
    /// Style prefix: `style_override` > file > `default_style`.
    /// Output root: `root_override` > file > `output`.
    pub fn resolve(
        self,
        style_override: Option<String>,
        root_override: Option<PathBuf>,
        default_style: &str,
    ) -> Result<BatchPlan> {
        if self.items.is_empty() {
            return Err(SpriteError::PlanError("No items in plan".to_string()));
        }
        Ok(BatchPlan {
            items: self.items,
            style_prefix: style_override
                .or(self.style_prefix)
                .unwrap_or_else(|| default_style.to_string()),
            output_root: root_override
                .or(self.output_root)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_ROOT)),
        })
    }
}

/// A validated plan ready to run
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPlan {
    pub items: Vec<BatchItem>,
    pub style_prefix: String,
    pub output_root: PathBuf,
}

impl BatchPlan {
    /// What a run would do, without touching the network
    pub fn preview(&self) -> Vec<PlannedItem> {
        self.items
            .iter()
            .map(|item| {
                let output_path = item.destination(&self.output_root);
                PlannedItem {
                    category: item.category.clone(),
                    filename: item.filename.clone(),
                    width: item.width,
                    height: item.height,
                    prompt_preview: preview(&item.full_prompt(&self.style_prefix)),
                    exists: output_path.exists(),
                    output_path,
                }
            })
            .collect()
    }
}

/// One dry-run line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedItem {
    pub category: String,
    pub filename: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub prompt_preview: String,
    pub output_path: PathBuf,
    pub exists: bool,
}

fn preview(prompt: &str) -> String {
    if prompt.chars().count() <= PREVIEW_CHARS {
        return prompt.to_string();
    }
    let mut cut: String = prompt.chars().take(PREVIEW_CHARS).collect();
    cut.push_str("...");
    cut
}
