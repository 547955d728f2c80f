// SPDX-License-Identifier: MIT

//! Machine identity: `{hostname}-{8 hex}`.
//!
//! The hex suffix doubles as the worktree suffix in branch names, so it must
//! stay stable for the life of the installation; it is generated once and
//! persisted by the config store.

use serde::{Deserialize, Serialize};

const HEX: [char; 16] =
    ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f'];

/// Identity advertised to the backend and baked into branch names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineIdentity {
    /// `{hostname}-{8 hex}`, unique per installation
    pub machine_id: String,
    /// Plain hostname, for display and heartbeat
    pub machine_name: String,
}

impl MachineIdentity {
    /// Mint a fresh identity for this host.
    pub fn generate(hostname: &str) -> Self {
        let hostname = sanitize_hostname(hostname);
        let machine_id = format!("{}-{}", hostname, nanoid::nanoid!(8, &HEX));
        Self { machine_id, machine_name: hostname }
    }

    /// Rebuild an identity from a persisted `machine_id` line.
    pub fn from_machine_id(machine_id: &str) -> Self {
        let machine_name = match machine_id.rsplit_once('-') {
            Some((host, _suffix)) => host.to_string(),
            None => machine_id.to_string(),
        };
        Self { machine_id: machine_id.trim().to_string(), machine_name }
    }

    /// The 8-hex worktree suffix used in branch names.
    pub fn suffix(&self) -> &str {
        match self.machine_id.rsplit_once('-') {
            Some((_, suffix)) => suffix,
            None => &self.machine_id,
        }
    }
}

/// Hostnames feed branch names; keep them free of characters git would
/// reject in a refname.
fn sanitize_hostname(hostname: &str) -> String {
    let cleaned: String = hostname
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '-' })
        .collect();
    if cleaned.is_empty() {
        "machine".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
