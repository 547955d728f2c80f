// SPDX-License-Identifier: MIT

use super::*;

fn identity() -> MachineIdentity {
    MachineIdentity::from_machine_id("buildbox-1a2b3c4d")
}

#[test]
fn requires_api_key() {
    let result = BackendClient::new(DEFAULT_BASE_URL, None, identity());
    assert!(matches!(result, Err(BackendError::MissingApiKey)));
}

#[test]
fn trims_trailing_slash_from_base_url() {
    let client =
        BackendClient::new("https://backend.example/", Some("sk-1".to_string()), identity())
            .unwrap();
    assert_eq!(client.url("/api/tasks"), "https://backend.example/api/tasks");
}

#[test]
fn endpoint_paths_embed_display_number() {
    let client =
        BackendClient::new(DEFAULT_BASE_URL, Some("sk-1".to_string()), identity()).unwrap();
    assert_eq!(
        client.url("/api/tasks/427/claim"),
        format!("{DEFAULT_BASE_URL}/api/tasks/427/claim")
    );
}
