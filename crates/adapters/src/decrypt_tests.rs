// SPDX-License-Identifier: MIT

use super::*;
use push_core::{ExecutionStatus, RepoUrl};

const KEY: [u8; 32] = [7u8; 32];

/// Build a wire blob: version ‖ nonce ‖ ciphertext ‖ tag, base64-encoded.
fn encrypt(plaintext: &str, version: u8) -> String {
    let cipher = Aes256Gcm::new_from_slice(&KEY).unwrap();
    let nonce_bytes = [9u8; NONCE_LEN];
    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher.encrypt(nonce, plaintext.as_bytes()).unwrap();

    let mut blob = vec![version];
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&ciphertext);
    BASE64.encode(blob)
}

fn decryptor() -> KeychainDecryptor {
    KeychainDecryptor::from_key(&KEY).unwrap()
}

#[test]
fn decrypts_version_zero_blob() {
    let encoded = encrypt("fix the login page", WIRE_VERSION);
    assert_eq!(decryptor().decrypt_field(&encoded), "fix the login page");
}

#[test]
fn unknown_version_passes_through() {
    let encoded = encrypt("secret", 1);
    assert_eq!(decryptor().decrypt_field(&encoded), encoded);
}

#[test]
fn garbage_passes_through() {
    assert_eq!(decryptor().decrypt_field("not base64!!"), "not base64!!");
    let short = BASE64.encode([0u8; 4]);
    assert_eq!(decryptor().decrypt_field(&short), short);
}

#[test]
fn wrong_key_passes_through() {
    let encoded = encrypt("secret", WIRE_VERSION);
    let other = KeychainDecryptor::from_key(&[1u8; 32]).unwrap();
    assert_eq!(other.decrypt_field(&encoded), encoded);
}

#[test]
fn from_key_rejects_bad_lengths() {
    assert!(KeychainDecryptor::from_key(&[0u8; 16]).is_none());
    assert!(KeychainDecryptor::from_key(&[]).is_none());
}

#[test]
fn passthrough_decryptor_is_identity() {
    assert_eq!(PassthroughDecryptor.decrypt_field("anything"), "anything");
}

#[test]
fn task_fields_decrypt_in_place() {
    let mut task = Task {
        task_id: "t-1".to_string(),
        display_number: 1,
        summary: encrypt("summary", WIRE_VERSION),
        content: encrypt("content", WIRE_VERSION),
        repo_url: RepoUrl::new("github.com/u/r"),
        execution_status: ExecutionStatus::Queued,
        encrypted: true,
        original_transcript: Some(encrypt("transcript", WIRE_VERSION)),
        attachments: vec![],
    };
    decrypt_task_fields(&mut task, &decryptor());
    assert_eq!(task.summary, "summary");
    assert_eq!(task.content, "content");
    assert_eq!(task.original_transcript.as_deref(), Some("transcript"));
}

#[test]
fn unencrypted_tasks_are_untouched() {
    let blob = encrypt("would decrypt", WIRE_VERSION);
    let mut task = Task {
        task_id: "t-1".to_string(),
        display_number: 1,
        summary: blob.clone(),
        content: String::new(),
        repo_url: RepoUrl::new("github.com/u/r"),
        execution_status: ExecutionStatus::Queued,
        encrypted: false,
        original_transcript: None,
        attachments: vec![],
    };
    decrypt_task_fields(&mut task, &decryptor());
    assert_eq!(task.summary, blob);
}
