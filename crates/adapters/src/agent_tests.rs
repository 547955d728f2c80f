// SPDX-License-Identifier: MIT

use super::*;

#[cfg(unix)]
fn stub_agent(dir: &std::path::Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("agent.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
#[tokio::test]
async fn streams_stdout_lines_and_exit() {
    let dir = tempfile::tempdir().unwrap();
    let program = stub_agent(
        dir.path(),
        "echo starting\necho\necho '{\"session_id\":\"S-9\"}'\necho oops >&2\nexit 0",
    );

    let mut invocation =
        AgentInvocation::new("do the thing", dir.path().to_path_buf());
    invocation.program = program.display().to_string();

    let mut handle = CodingAgentAdapter.spawn(invocation).await.unwrap();
    assert!(handle.pid.is_some());

    let mut lines = Vec::new();
    while let Some(line) = handle.lines.recv().await {
        lines.push(line);
    }
    // the blank line is dropped
    assert_eq!(lines, vec!["starting", "{\"session_id\":\"S-9\"}"]);

    let exit = handle.exit.await.unwrap();
    assert_eq!(exit.code, Some(0));
    assert!(exit.stderr_tail.contains("oops"));
}

#[cfg(unix)]
#[tokio::test]
async fn nonzero_exit_code_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let program = stub_agent(dir.path(), "echo line\nexit 7");

    let mut invocation = AgentInvocation::new("x", dir.path().to_path_buf());
    invocation.program = program.display().to_string();

    let mut handle = CodingAgentAdapter.spawn(invocation).await.unwrap();
    while handle.lines.recv().await.is_some() {}
    assert_eq!(handle.exit.await.unwrap().code, Some(7));
}

#[cfg(unix)]
#[tokio::test]
async fn terminate_kills_a_looping_agent() {
    let dir = tempfile::tempdir().unwrap();
    let program = stub_agent(dir.path(), "while true; do echo tick; sleep 0.1; done");

    let mut invocation = AgentInvocation::new("x", dir.path().to_path_buf());
    invocation.program = program.display().to_string();

    let mut handle = CodingAgentAdapter.spawn(invocation).await.unwrap();
    let pid = handle.pid.unwrap();

    // it is alive and producing output
    assert!(handle.lines.recv().await.is_some());

    terminate(pid, Duration::from_millis(500)).await;

    // drain to EOF, then the reaper reports a signal death (no exit code)
    while handle.lines.recv().await.is_some() {}
    let exit = tokio::time::timeout(Duration::from_secs(5), handle.exit).await.unwrap().unwrap();
    assert_eq!(exit.code, None);
}

#[tokio::test]
async fn missing_program_is_spawn_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut invocation = AgentInvocation::new("x", dir.path().to_path_buf());
    invocation.program = "no-such-agent-binary-77".to_string();
    let result = CodingAgentAdapter.spawn(invocation).await;
    assert!(matches!(result, Err(AgentError::Spawn { .. })));
}

#[tokio::test]
async fn fake_adapter_plays_scripts_in_order() {
    let fake = FakeAgentAdapter::new();
    fake.push_script(FakeAgentScript {
        lines: vec!["one".to_string(), "two".to_string()],
        exit_code: 2,
        stderr_tail: "boom".to_string(),
        line_delay: Duration::ZERO,
    });

    let mut handle = fake
        .spawn(AgentInvocation::new("p", PathBuf::from("/tmp")))
        .await
        .unwrap();

    let mut lines = Vec::new();
    while let Some(line) = handle.lines.recv().await {
        lines.push(line);
    }
    assert_eq!(lines, vec!["one", "two"]);

    let exit = handle.exit.await.unwrap();
    assert_eq!(exit.code, Some(2));
    assert_eq!(exit.stderr_tail, "boom");

    let invocations = fake.invocations();
    assert_eq!(invocations.len(), 1);
    assert_eq!(invocations[0].prompt, "p");
}
