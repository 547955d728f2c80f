// SPDX-License-Identifier: MIT

//! Canonical repository URLs.
//!
//! The backend, the project registry, and the heartbeat headers all key on
//! the canonical form `host/owner/name`: no scheme, no trailing `.git`.

use serde::{Deserialize, Serialize};

/// A repository URL in canonical `host/owner/name` form.
///
/// Construction canonicalizes common clone-URL shapes (`https://`, `ssh://`,
/// `git@host:owner/name.git`), so two registry entries for the same repo
/// always collide on the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoUrl(String);

impl RepoUrl {
    pub fn new(raw: &str) -> Self {
        Self(canonicalize(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment, the repository name.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl std::fmt::Display for RepoUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RepoUrl {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RepoUrl {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

fn canonicalize(raw: &str) -> String {
    let mut s = raw.trim();

    for scheme in ["https://", "http://", "ssh://", "git://"] {
        if let Some(rest) = s.strip_prefix(scheme) {
            s = rest;
            break;
        }
    }

    // scp-like syntax: git@github.com:owner/name
    let s = if let Some(rest) = s.strip_prefix("git@") {
        rest.replacen(':', "/", 1)
    } else if let Some((userinfo, rest)) = s.split_once('@') {
        // ssh://user@host/owner/name
        let _ = userinfo;
        rest.to_string()
    } else {
        s.to_string()
    };

    let s = s.strip_suffix('/').unwrap_or(&s);
    let s = s.strip_suffix(".git").unwrap_or(s);
    s.to_ascii_lowercase()
}

#[cfg(test)]
#[path = "repo_tests.rs"]
mod tests;
