// SPDX-License-Identifier: MIT

//! Shared fixtures for engine tests: a real git repo, a registered
//! project, and an [`Engine`] wired to fakes.

use crate::{Engine, EngineConfig, EngineDeps};
use push_adapters::{FakeAgentAdapter, FakeNotifier, PassthroughDecryptor, PullRequestHook};
use push_backend::FakeBackend;
use push_core::{ExecutionStatus, FakeClock, MachineIdentity, RepoUrl, Task};
use push_storage::ProjectRegistry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const TEST_REPO_URL: &str = "github.com/u/r";
pub const TEST_SUFFIX: &str = "1a2b3c4d";

pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = std::process::Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .env_remove("GIT_DIR")
        .env_remove("GIT_WORK_TREE")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub struct Harness {
    pub engine: Arc<Engine<FakeClock>>,
    pub clock: FakeClock,
    pub backend: FakeBackend,
    pub agents: FakeAgentAdapter,
    pub notifier: FakeNotifier,
    pub repo_path: PathBuf,
    pub config_dir: PathBuf,
    pub state_dir: PathBuf,
    // Held for its Drop; the whole fixture lives under this directory.
    _root: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A harness whose engine spawns a real shell script as the agent.
    /// Only the timeout/kill paths need real processes.
    #[cfg(unix)]
    pub fn with_real_agent(script_body: &str) -> Self {
        Self::build(Some(script_body))
    }

    fn build(real_agent_script: Option<&str>) -> Self {
        let root = tempfile::tempdir().unwrap();
        let config_dir = root.path().join("config");
        let state_dir = root.path().join("state");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::create_dir_all(&state_dir).unwrap();

        // A real repo with one commit, registered under TEST_REPO_URL.
        let repo_path = root.path().join("checkouts").join("repo");
        std::fs::create_dir_all(&repo_path).unwrap();
        git(&repo_path, &["init"]);
        git(&repo_path, &["config", "user.email", "test@example.com"]);
        git(&repo_path, &["config", "user.name", "test"]);
        std::fs::write(repo_path.join("README.md"), "hello\n").unwrap();
        git(&repo_path, &["add", "."]);
        git(&repo_path, &["commit", "-m", "init"]);

        let mut registry = ProjectRegistry::default();
        registry.register(
            RepoUrl::new(TEST_REPO_URL),
            repo_path.clone(),
            "2025-06-15T00:00:00Z",
        );
        registry.save(&config_dir).unwrap();

        let clock = FakeClock::new();
        let backend = FakeBackend::new();
        let agents = FakeAgentAdapter::new();
        let notifier = FakeNotifier::new();

        let mut config = EngineConfig::new(config_dir.clone(), state_dir.clone());
        config.termination_grace = Duration::from_millis(300);
        config.version = "0.1.0-test".to_string();

        let agent_adapter: Arc<dyn push_adapters::AgentAdapter> = match real_agent_script {
            None => Arc::new(agents.clone()),
            Some(body) => {
                let script = root.path().join("stub-agent.sh");
                std::fs::write(&script, format!("#!/bin/sh\n{body}\n")).unwrap();
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    std::fs::set_permissions(
                        &script,
                        std::fs::Permissions::from_mode(0o755),
                    )
                    .unwrap();
                }
                config.agent_program = script.display().to_string();
                Arc::new(push_adapters::CodingAgentAdapter)
            }
        };

        let deps = EngineDeps {
            backend: Arc::new(backend.clone()),
            agents: agent_adapter,
            notifier: Arc::new(notifier.clone()),
            decryptor: Arc::new(PassthroughDecryptor),
            // Points at a command that never exists; the hook logs and
            // returns None, which is exactly the production fallback.
            pr_hook: PullRequestHook::with_program("push-test-no-pr-command"),
            identity: MachineIdentity::from_machine_id(&format!("testbox-{TEST_SUFFIX}")),
        };

        let engine = Engine::new(deps, config, clock.clone());
        Self {
            engine,
            clock,
            backend,
            agents,
            notifier,
            repo_path,
            config_dir,
            state_dir,
            _root: root,
        }
    }

    pub fn task(&self, display_number: u32, summary: &str) -> Task {
        Task {
            task_id: format!("t-{display_number}"),
            display_number,
            summary: summary.to_string(),
            content: format!("do the work for #{display_number}"),
            repo_url: RepoUrl::new(TEST_REPO_URL),
            execution_status: ExecutionStatus::Queued,
            encrypted: false,
            original_transcript: None,
            attachments: vec![],
        }
    }

    pub fn worktree_dir(&self, display_number: u32) -> PathBuf {
        self.engine.worktrees.worktree_path(&self.repo_path, display_number)
    }

    pub fn branch_exists(&self, display_number: u32) -> bool {
        let branch = self.engine.worktrees.branch_name(display_number);
        git(&self.repo_path, &["branch", "--list", &branch]).contains(&branch)
    }

    /// Wait until `predicate` holds or panic after a few seconds.
    pub async fn wait_for(&self, what: &str, mut predicate: impl FnMut() -> bool) {
        let deadline = std::time::Instant::now() + Duration::from_secs(10);
        while !predicate() {
            assert!(std::time::Instant::now() < deadline, "timed out waiting for {what}");
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}
