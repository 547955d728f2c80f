// SPDX-License-Identifier: MIT

use super::*;
use serial_test::serial;

#[test]
#[serial(push_env)]
fn tick_interval_defaults_to_thirty_seconds() {
    std::env::remove_var("PUSH_TICK_MS");
    assert_eq!(tick_interval(), Duration::from_secs(30));
}

#[test]
#[serial(push_env)]
fn tick_interval_honors_override() {
    std::env::set_var("PUSH_TICK_MS", "500");
    assert_eq!(tick_interval(), Duration::from_millis(500));
    std::env::remove_var("PUSH_TICK_MS");
}

#[test]
#[serial(push_env)]
fn garbage_tick_override_falls_back() {
    std::env::set_var("PUSH_TICK_MS", "soon");
    assert_eq!(tick_interval(), Duration::from_secs(30));
    std::env::remove_var("PUSH_TICK_MS");
}

#[test]
#[serial(push_env)]
fn api_url_override() {
    std::env::set_var("PUSH_API_URL", "http://127.0.0.1:4000");
    assert_eq!(api_url(), "http://127.0.0.1:4000");
    std::env::remove_var("PUSH_API_URL");
    assert_eq!(api_url(), push_backend::DEFAULT_BASE_URL);
}

#[test]
#[serial(push_env)]
fn hostname_prefers_explicit_override() {
    std::env::set_var("PUSH_MACHINE_NAME", "named-box");
    assert_eq!(hostname(), "named-box");
    std::env::remove_var("PUSH_MACHINE_NAME");
    assert!(!hostname().is_empty());
}
