// SPDX-License-Identifier: MIT

//! Optional end-to-end decryption of task fields.
//!
//! Encrypted fields arrive as base64 of `version(1) ‖ nonce(12) ‖ ct ‖ tag(16)`
//! under AES-GCM-256. The key comes from an OS keychain helper, fetched once
//! per process. Decryption never fails a task: any problem passes the
//! original value through and the field stays opaque.

use crate::subprocess::{run_with_timeout, HOOK_TIMEOUT};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use push_core::Task;
use std::path::Path;
use tokio::process::Command;

/// Only ciphertext version 0 is recognized.
const WIRE_VERSION: u8 = 0;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

pub trait Decryptor: Send + Sync + 'static {
    /// Decrypt one field, returning the input unchanged on any failure.
    fn decrypt_field(&self, value: &str) -> String;
}

/// Used when no keychain helper is available; fields stay opaque.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughDecryptor;

impl Decryptor for PassthroughDecryptor {
    fn decrypt_field(&self, value: &str) -> String {
        value.to_string()
    }
}

/// AES-GCM-256 decryptor keyed from the keychain helper.
pub struct KeychainDecryptor {
    cipher: Aes256Gcm,
}

impl KeychainDecryptor {
    /// Probe the helper (`--check`), then fetch the key (default
    /// invocation prints base64 to stdout). `None` when the helper is
    /// absent, reports no key, or prints something unusable.
    pub async fn from_helper(helper: &Path) -> Option<Self> {
        let mut check = Command::new(helper);
        check.arg("--check");
        match run_with_timeout(check, HOOK_TIMEOUT, "keychain --check").await {
            Ok(output) if output.status.success() => {}
            Ok(_) | Err(_) => {
                tracing::debug!(helper = %helper.display(), "keychain helper has no key");
                return None;
            }
        }

        let fetch = Command::new(helper);
        let output = match run_with_timeout(fetch, HOOK_TIMEOUT, "keychain fetch").await {
            Ok(output) if output.status.success() => output,
            Ok(_) | Err(_) => return None,
        };

        let encoded = String::from_utf8_lossy(&output.stdout);
        let key = BASE64.decode(encoded.trim()).ok()?;
        Self::from_key(&key)
    }

    /// Build from raw key bytes; `None` unless exactly 32 bytes.
    pub fn from_key(key: &[u8]) -> Option<Self> {
        let cipher = Aes256Gcm::new_from_slice(key).ok()?;
        Some(Self { cipher })
    }

    fn try_decrypt(&self, encoded: &str) -> Option<String> {
        let bytes = BASE64.decode(encoded).ok()?;
        if bytes.len() < 1 + NONCE_LEN + TAG_LEN || bytes[0] != WIRE_VERSION {
            return None;
        }
        let nonce = Nonce::from_slice(&bytes[1..1 + NONCE_LEN]);
        // ciphertext ‖ tag, as the aead API expects
        let plaintext = self.cipher.decrypt(nonce, &bytes[1 + NONCE_LEN..]).ok()?;
        String::from_utf8(plaintext).ok()
    }
}

impl Decryptor for KeychainDecryptor {
    fn decrypt_field(&self, value: &str) -> String {
        match self.try_decrypt(value) {
            Some(plaintext) => plaintext,
            None => value.to_string(),
        }
    }
}

/// Decrypt the encrypted fields of a task in place.
pub fn decrypt_task_fields(task: &mut Task, decryptor: &dyn Decryptor) {
    if !task.encrypted {
        return;
    }
    task.summary = decryptor.decrypt_field(&task.summary);
    task.content = decryptor.decrypt_field(&task.content);
    if let Some(transcript) = task.original_transcript.take() {
        task.original_transcript = Some(decryptor.decrypt_field(&transcript));
    }
}

#[cfg(test)]
#[path = "decrypt_tests.rs"]
mod tests;
