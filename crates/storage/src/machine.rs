// SPDX-License-Identifier: MIT

//! Persisted machine identity: `<config_dir>/machine_id`, one line, written
//! once and never rotated. Branch names embed its hex suffix, so rewriting
//! this file would orphan every branch this machine has created.

use crate::StorageError;
use push_core::MachineIdentity;
use std::path::Path;

pub fn load_or_create_identity(
    config_dir: &Path,
    hostname: &str,
) -> Result<MachineIdentity, StorageError> {
    let path = config_dir.join("machine_id");

    match std::fs::read_to_string(&path) {
        Ok(contents) => {
            let line = contents.trim();
            if !line.is_empty() {
                return Ok(MachineIdentity::from_machine_id(line));
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(source) => return Err(StorageError::Read { path, source }),
    }

    let identity = MachineIdentity::generate(hostname);
    let wrap = |source: std::io::Error| StorageError::Write { path: path.clone(), source };
    std::fs::create_dir_all(config_dir).map_err(wrap)?;
    std::fs::write(&path, format!("{}\n", identity.machine_id)).map_err(wrap)?;
    tracing::info!(machine_id = %identity.machine_id, "generated machine identity");
    Ok(identity)
}

#[cfg(test)]
#[path = "machine_tests.rs"]
mod tests;
