//! Preset file discovery.
//!
//! Recursively searches a directory tree for preset files. The result list is
//! sorted so the enqueue order (and therefore the rough processing order) is
//! stable across runs.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, WavefarmError};

/// File extension for preset documents.
pub const PRESET_EXTENSION: &str = "preset";

/// Recursively collect all preset files under `dir`, sorted by path.
pub fn discover_presets(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(WavefarmError::PresetDirNotFound(dir.to_path_buf()));
    }

    let mut found = Vec::new();
    walk(dir, &mut found)?;
    found.sort();

    tracing::debug!(count = found.len(), dir = %dir.display(), "preset discovery complete");
    Ok(found)
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            walk(&path, out)?;
        } else if has_preset_extension(&path) {
            out.push(path);
        }
    }
    Ok(())
}

fn has_preset_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PRESET_EXTENSION))
}
