// SPDX-License-Identifier: MIT

//! On-disk artifacts of the push daemon: the line-oriented config file,
//! the persisted machine identity, the project registry, and the status
//! snapshot. Every JSON document is written temp-then-rename so readers
//! never observe a partial file.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod atomic;
pub mod config;
pub mod machine;
pub mod paths;
pub mod registry;
pub mod status;

pub use atomic::{write_atomic, write_json_atomic};
pub use config::Settings;
pub use machine::load_or_create_identity;
pub use registry::{ProjectEntry, ProjectRegistry};
pub use status::{DaemonInfo, StatusSnapshot, StatusStats, TaskStatusEntry};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("could not determine home directory")]
    NoHomeDir,

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
