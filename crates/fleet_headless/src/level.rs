//! Level file loading.
//!
//! Reads level definitions from RON files on disk. The core crate only
//! parses text; everything touching the filesystem lives here.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use fleet_core::data::LevelData;
use fleet_core::error::GameError;
use thiserror::Error;

/// Errors that can occur while loading a level file.
#[derive(Debug, Error)]
pub enum LevelFileError {
    /// No file at the given path.
    #[error("Level file not found: {0}")]
    FileNotFound(PathBuf),

    /// The file exists but could not be read.
    #[error("Failed to read level file: {0}")]
    ReadError(#[from] io::Error),

    /// The file is not valid level RON.
    #[error("Failed to parse level file: {0}")]
    ParseError(#[from] ron::error::SpannedError),

    /// The level parsed but failed validation.
    #[error("Invalid level: {0}")]
    Invalid(#[from] GameError),
}

/// Load and validate a level from `path`.
pub fn load_level(path: &Path) -> Result<LevelData, LevelFileError> {
    if !path.exists() {
        return Err(LevelFileError::FileNotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    let level: LevelData = ron::from_str(&text)?;
    level.validate()?;
    tracing::debug!(path = %path.display(), name = %level.name, "loaded level");
    Ok(level)
}

/// Levels found in a directory, with per-file failures kept apart.
#[derive(Debug, Default)]
pub struct LevelSet {
    /// Levels that loaded, sorted by path.
    pub levels: Vec<(PathBuf, LevelData)>,
    /// Files that failed, sorted by path.
    pub failures: Vec<(PathBuf, LevelFileError)>,
}

/// Load every `.ron` file in `dir`. A broken file is recorded in
/// [`LevelSet::failures`] and does not stop the others from loading.
pub fn load_level_dir(dir: &Path) -> Result<LevelSet, LevelFileError> {
    if !dir.is_dir() {
        return Err(LevelFileError::FileNotFound(dir.to_path_buf()));
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "ron"))
        .collect();
    paths.sort();

    let mut set = LevelSet::default();
    for path in paths {
        match load_level(&path) {
            Ok(level) => set.levels.push((path, level)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping level");
                set.failures.push((path, e));
            }
        }
    }
    Ok(set)
}

/// Resolve the bundled level directory.
///
/// Checks `FLEET_LEVEL_DIR` first, then the standard locations relative to
/// the repo root and to this crate.
pub fn default_level_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("FLEET_LEVEL_DIR") {
        let path = PathBuf::from(dir);
        if path.is_dir() {
            return Some(path);
        }
    }

    ["crates/fleet_headless/levels", "levels"]
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_dir())
}
