// SPDX-License-Identifier: MIT

//! Workspace-level specs: drive the built `push` and `pushd` binaries
//! against a throwaway state directory.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

#[path = "specs/daemon/lifecycle.rs"]
mod daemon_lifecycle;
#[path = "specs/daemon/status.rs"]
mod daemon_status;
#[path = "specs/support.rs"]
mod support;
