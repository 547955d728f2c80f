// SPDX-License-Identifier: MIT

//! Daemon log: line-oriented file, rotated by size.
//!
//! `daemon.log` rolls to `daemon.log.1` … `daemon.log.3` once it passes
//! 10 MB; the oldest backup falls off.

use crate::lifecycle::LifecycleError;
use std::io::Write;
use std::path::{Path, PathBuf};

const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;
const MAX_BACKUPS: usize = 3;

/// Install the global tracing subscriber writing through a non-blocking
/// size-rotating file writer. The returned guard flushes on drop.
pub fn init(log_path: &Path) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    let writer = RotatingWriter::open(log_path.to_path_buf(), MAX_LOG_BYTES, MAX_BACKUPS)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(writer);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    Ok(guard)
}

/// Size-rotating writer: checked before every write, so a single line can
/// overshoot the limit slightly but the file never grows unbounded.
pub struct RotatingWriter {
    path: PathBuf,
    file: std::fs::File,
    written: u64,
    max_bytes: u64,
    backups: usize,
}

impl RotatingWriter {
    pub fn open(path: PathBuf, max_bytes: u64, backups: usize) -> Result<Self, LifecycleError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata().map(|m| m.len()).unwrap_or(0);
        Ok(Self { path, file, written, max_bytes, backups })
    }

    fn rotate(&mut self) -> std::io::Result<()> {
        self.file.flush()?;

        // daemon.log.2 -> daemon.log.3, daemon.log.1 -> daemon.log.2, ...
        let backup = |n: usize| -> PathBuf {
            let mut name = self.path.as_os_str().to_owned();
            name.push(format!(".{n}"));
            PathBuf::from(name)
        };
        let oldest = backup(self.backups);
        if oldest.exists() {
            let _ = std::fs::remove_file(&oldest);
        }
        for n in (1..self.backups).rev() {
            let from = backup(n);
            if from.exists() {
                let _ = std::fs::rename(&from, backup(n + 1));
            }
        }
        let _ = std::fs::rename(&self.path, backup(1));

        self.file = std::fs::OpenOptions::new().create(true).append(true).open(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.written >= self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
