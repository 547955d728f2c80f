// SPDX-License-Identifier: MIT

//! Daemon internals: configuration, lifecycle and logging. The `pushd`
//! binary is a thin driver over these.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod env;
pub mod lifecycle;
pub mod logging;
