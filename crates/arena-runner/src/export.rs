//! Replay files for finished games.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use arena_coordination::GameExport;
use chrono::{DateTime, Local};
use tracing::info;

/// `replay_<YYYYmmdd_HHMMSS>.json` for the given instant.
pub fn replay_file_name(at: DateTime<Local>) -> String {
    format!("replay_{}.json", at.format("%Y%m%d_%H%M%S"))
}

/// Write `export` into `dir`, creating the directory if needed.
///
/// Games finishing within the same second get a numeric suffix instead of
/// overwriting each other.
pub fn write_export(dir: &Path, export: &GameExport) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export dir {}", dir.display()))?;

    let json = export
        .to_json()
        .context("Failed to serialize game export")?;

    let base = replay_file_name(Local::now());
    let mut path = dir.join(&base);
    let mut suffix = 1;
    while path.exists() {
        let stem = base.trim_end_matches(".json");
        path = dir.join(format!("{stem}_{suffix}.json"));
        suffix += 1;
    }

    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write replay {}", path.display()))?;
    info!(path = %path.display(), game_id = %export.game_id, "Replay exported");
    Ok(path)
}
