// SPDX-License-Identifier: MIT

//! Centralized environment variable access for the daemon crate.

use std::time::Duration;

/// Scheduler tick override, `PUSH_TICK_MS`.
pub fn tick_interval() -> Duration {
    std::env::var("PUSH_TICK_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(push_engine::TICK_INTERVAL)
}

/// Backend base URL, `PUSH_API_URL`.
pub fn api_url() -> String {
    std::env::var("PUSH_API_URL")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| push_backend::DEFAULT_BASE_URL.to_string())
}

/// Agent binary override, `PUSH_AGENT_BIN`.
pub fn agent_program() -> Option<String> {
    std::env::var("PUSH_AGENT_BIN").ok().filter(|s| !s.is_empty())
}

/// `--allowed-tools` CSV passed through to the agent, `PUSH_ALLOWED_TOOLS`.
pub fn allowed_tools() -> Option<String> {
    std::env::var("PUSH_ALLOWED_TOOLS").ok().filter(|s| !s.is_empty())
}

/// Keychain helper binary, `PUSH_KEYCHAIN_HELPER`. Resolved on PATH when
/// relative; decryption is a pass-through when the helper is absent.
pub fn keychain_helper() -> String {
    std::env::var("PUSH_KEYCHAIN_HELPER")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "push-keychain".to_string())
}

/// This machine's hostname, for identity generation.
pub fn hostname() -> String {
    if let Ok(name) = std::env::var("PUSH_MACHINE_NAME") {
        if !name.is_empty() {
            return name;
        }
    }
    #[cfg(unix)]
    {
        if let Ok(name) = nix::unistd::gethostname() {
            let name = name.to_string_lossy();
            if !name.is_empty() {
                return name.into_owned();
            }
        }
    }
    std::env::var("HOSTNAME").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| "machine".to_string())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
