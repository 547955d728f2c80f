// SPDX-License-Identifier: MIT

//! The line-oriented `config` file: `PUSH_NAME=value`, one setting per line.
//!
//! A process environment variable with the same full name overrides the
//! file value. The daemon only reads this file; the `connect` flow in the
//! CLI is the single writer.

use crate::StorageError;
use std::collections::HashMap;
use std::path::Path;

/// Recognized keys, with their on-disk `PUSH_` prefix.
pub const KEY_API_KEY: &str = "PUSH_API_KEY";
pub const KEY_EMAIL: &str = "PUSH_EMAIL";
pub const KEY_AUTO_COMMIT: &str = "PUSH_AUTO_COMMIT";
pub const KEY_AUTO_MERGE: &str = "PUSH_AUTO_MERGE";
pub const KEY_AUTO_COMPLETE: &str = "PUSH_AUTO_COMPLETE";
pub const KEY_MAX_BATCH_SIZE: &str = "PUSH_MAX_BATCH_SIZE";

/// Parsed settings with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_key: Option<String>,
    pub email: Option<String>,
    pub auto_commit: bool,
    pub auto_merge: bool,
    pub auto_complete: bool,
    /// 1..=20, CLI batch queueing only
    pub max_batch_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            email: None,
            auto_commit: true,
            auto_merge: true,
            auto_complete: true,
            max_batch_size: 5,
        }
    }
}

impl Settings {
    /// Load `<config_dir>/config`, then apply environment overrides.
    ///
    /// A missing file yields defaults; a fresh install has no config until
    /// `connect` writes one.
    pub fn load(config_dir: &Path) -> Result<Self, StorageError> {
        let path = config_dir.join("config");
        let raw = match std::fs::read_to_string(&path) {
            Ok(text) => parse_lines(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(source) => return Err(StorageError::Read { path, source }),
        };

        let get = |key: &str| -> Option<String> {
            std::env::var(key).ok().filter(|v| !v.is_empty()).or_else(|| raw.get(key).cloned())
        };

        let defaults = Settings::default();
        Ok(Self {
            api_key: get(KEY_API_KEY),
            email: get(KEY_EMAIL),
            auto_commit: get(KEY_AUTO_COMMIT).map_or(defaults.auto_commit, |v| parse_bool(&v)),
            auto_merge: get(KEY_AUTO_MERGE).map_or(defaults.auto_merge, |v| parse_bool(&v)),
            auto_complete: get(KEY_AUTO_COMPLETE)
                .map_or(defaults.auto_complete, |v| parse_bool(&v)),
            max_batch_size: get(KEY_MAX_BATCH_SIZE)
                .and_then(|v| v.parse::<u32>().ok())
                .map(|n| n.clamp(1, 20))
                .unwrap_or(defaults.max_batch_size),
        })
    }
}

fn parse_lines(text: &str) -> HashMap<String, String> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let (name, value) = line.split_once('=')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

fn parse_bool(value: &str) -> bool {
    !matches!(value.to_ascii_lowercase().as_str(), "0" | "false" | "off" | "no")
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
