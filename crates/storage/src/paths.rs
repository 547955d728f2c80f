// SPDX-License-Identifier: MIT

//! Config and state directory resolution.

use crate::StorageError;
use std::path::PathBuf;

/// Resolve config directory: PUSH_CONFIG_DIR > XDG config dir > ~/.config, plus `push`
pub fn config_dir() -> Result<PathBuf, StorageError> {
    if let Ok(dir) = std::env::var("PUSH_CONFIG_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .map(|dir| dir.join("push"))
        .ok_or(StorageError::NoHomeDir)
}

/// Resolve state directory: PUSH_STATE_DIR > XDG state dir > ~/.local/state, plus `push`
pub fn state_dir() -> Result<PathBuf, StorageError> {
    if let Ok(dir) = std::env::var("PUSH_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::state_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/state")))
        .map(|dir| dir.join("push"))
        .ok_or(StorageError::NoHomeDir)
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
