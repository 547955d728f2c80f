// SPDX-License-Identifier: MIT

//! Adapters to the outside world: the coding-agent subprocess, the optional
//! keychain decryptor, desktop notifications, and the best-effort pull
//! request hook. Everything here is replaceable in tests.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod agent;
pub mod decrypt;
pub mod notify;
pub mod pr;
pub mod subprocess;

pub use agent::{AgentAdapter, AgentError, AgentExit, AgentHandle, AgentInvocation, CodingAgentAdapter};
pub use decrypt::{decrypt_task_fields, Decryptor, KeychainDecryptor, PassthroughDecryptor};
pub use notify::{DesktopNotifier, Notifier};
pub use pr::PullRequestHook;
pub use subprocess::{run_with_timeout, SubprocessError, GIT_TIMEOUT};

#[cfg(any(test, feature = "test-support"))]
pub use agent::{FakeAgentAdapter, FakeAgentScript};
#[cfg(any(test, feature = "test-support"))]
pub use notify::FakeNotifier;
