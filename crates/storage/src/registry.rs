// SPDX-License-Identifier: MIT

//! Project registry: canonical repo URL → local checkout path.
//!
//! `<config_dir>/projects.json`, version 1. One local path per repo URL;
//! re-registering replaces it. Corrupt documents are treated as empty and
//! rewritten on the next save.

use crate::{write_json_atomic, StorageError};
use push_core::RepoUrl;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const REGISTRY_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectEntry {
    pub local_path: PathBuf,
    /// RFC 3339 UTC
    pub registered_at: String,
    /// RFC 3339 UTC; bumped on execution, not on read-only status checks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRegistry {
    pub version: u32,
    #[serde(default)]
    pub projects: BTreeMap<RepoUrl, ProjectEntry>,
    #[serde(default)]
    pub default_project: Option<RepoUrl>,
}

impl Default for ProjectRegistry {
    fn default() -> Self {
        Self { version: REGISTRY_VERSION, projects: BTreeMap::new(), default_project: None }
    }
}

impl ProjectRegistry {
    pub fn path(config_dir: &Path) -> PathBuf {
        config_dir.join("projects.json")
    }

    /// Load the registry. Missing file → empty; corrupt file → empty (logged).
    pub fn load(config_dir: &Path) -> Result<Self, StorageError> {
        let path = Self::path(config_dir);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => return Err(StorageError::Read { path, source }),
        };

        match serde_json::from_str(&text) {
            Ok(registry) => Ok(registry),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt projects.json, treating as empty");
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, config_dir: &Path) -> Result<(), StorageError> {
        write_json_atomic(&Self::path(config_dir), self)
    }

    /// Register (or re-register) a project. Replaces any previous path.
    pub fn register(&mut self, repo_url: RepoUrl, local_path: PathBuf, now_rfc3339: &str) {
        let entry = ProjectEntry {
            local_path,
            registered_at: now_rfc3339.to_string(),
            last_used: None,
        };
        self.projects.insert(repo_url.clone(), entry);
        if self.default_project.is_none() {
            self.default_project = Some(repo_url);
        }
    }

    /// Look up the local path for a repo URL without touching `last_used`.
    pub fn resolve(&self, repo_url: &RepoUrl) -> Option<&Path> {
        self.projects.get(repo_url).map(|entry| entry.local_path.as_path())
    }

    /// Bump `last_used`. Callers persist with [`save`](Self::save) when a
    /// run actually starts.
    pub fn touch_last_used(&mut self, repo_url: &RepoUrl, now_rfc3339: &str) {
        if let Some(entry) = self.projects.get_mut(repo_url) {
            entry.last_used = Some(now_rfc3339.to_string());
        }
    }

    /// Registered repo URLs in stable order, for the heartbeat header.
    pub fn repo_urls(&self) -> Vec<&RepoUrl> {
        self.projects.keys().collect()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
