// SPDX-License-Identifier: MIT

//! Fire-and-forget desktop notifications for stuck and idle tasks.

pub trait Notifier: Send + Sync + 'static {
    /// Best-effort: failures are logged, never returned.
    fn notify(&self, title: &str, body: &str);
}

/// Desktop notifications via notify-rust.
///
/// On macOS the first notification triggers a bundle-identifier lookup via
/// AppleScript, which blocks forever in a daemon that lacks Automation
/// permissions. Pre-setting the identifier at construction skips the lookup.
#[derive(Clone, Copy, Debug, Default)]
pub struct DesktopNotifier;

impl DesktopNotifier {
    pub fn new() -> Self {
        #[cfg(target_os = "macos")]
        {
            let _ = mac_notification_sys::set_application("com.apple.Terminal");
        }
        Self
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, body: &str) {
        let title = title.to_string();
        let body = body.to_string();
        // Showing is synchronous on some platforms; keep it off the runtime.
        tokio::task::spawn_blocking(move || {
            if let Err(e) =
                notify_rust::Notification::new().summary(&title).body(&body).show()
            {
                tracing::warn!(%title, error = %e, "desktop notification failed");
            }
        });
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::Notifier;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Records notifications instead of showing them.
    #[derive(Clone, Default)]
    pub struct FakeNotifier {
        sent: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl FakeNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().clone()
        }
    }

    impl Notifier for FakeNotifier {
        fn notify(&self, title: &str, body: &str) {
            self.sent.lock().push((title.to_string(), body.to_string()));
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeNotifier;

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
