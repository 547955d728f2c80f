// SPDX-License-Identifier: MIT

//! Temp-then-rename writes. Readers either see the old document or the new
//! one, never a torn write.

use crate::StorageError;
use std::path::Path;

pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let wrap_write =
        |source: std::io::Error| StorageError::Write { path: path.to_path_buf(), source };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(wrap_write)?;
    }

    // Temp file in the same directory so the rename stays on one filesystem.
    let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.tmp-{}", file_name, std::process::id()));

    std::fs::write(&tmp, bytes).map_err(wrap_write)?;
    if let Err(source) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(wrap_write(source));
    }
    Ok(())
}

pub fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let mut bytes = serde_json::to_vec_pretty(value)
        .map_err(|source| StorageError::Encode { path: path.to_path_buf(), source })?;
    bytes.push(b'\n');
    write_atomic(path, &bytes)
}

#[cfg(test)]
#[path = "atomic_tests.rs"]
mod tests;
