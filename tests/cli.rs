//! Integration tests for top-level CLI behavior.
//!
//! Only offline paths are exercised; nothing here reaches a tracker.

use std::process::Command;

fn run_tracktools(args: &[&str]) -> std::process::Output {
    let bin = env!("CARGO_BIN_EXE_tracktools");
    Command::new(bin)
        .args(args)
        .env_remove("YOUTRACK_URL")
        .env_remove("YOUTRACK_TOKEN")
        .output()
        .expect("failed to run tracktools binary")
}

#[test]
fn tools_subcommand_lists_registered_tools() {
    let output = run_tracktools(&["tools"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    for name in [
        "get_issues",
        "get_issue_details",
        "get_issue_custom_fields",
        "get_issue_comments",
        "comment_issue",
        "update_field",
        "set_issue_tags",
        "remove_issue_tags",
    ] {
        assert!(stdout.contains(name), "missing tool {name} in: {stdout}");
    }
}

#[test]
fn call_rejects_malformed_args_json() {
    let output = run_tracktools(&["call", "--tool", "get_issues", "--args", "{not json"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("invalid --args JSON"), "unexpected stderr: {stderr}");
}

#[test]
fn call_requires_tool_argument() {
    let output = run_tracktools(&["call"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("--tool"), "unexpected stderr: {stderr}");
}

#[test]
fn interactive_help_shows_transport_flags() {
    let output = run_tracktools(&["interactive", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("--subprocess"));
    assert!(stdout.contains("--runner"));
}

#[cfg(unix)]
#[test]
fn interrupt_ends_interactive_session_gracefully() {
    use std::process::Stdio;
    use std::thread;
    use std::time::Duration;

    // Subprocess mode needs no tracker configuration; stdin stays open
    // so the session is parked at the prompt when the signal arrives.
    let bin = env!("CARGO_BIN_EXE_tracktools");
    let child = Command::new(bin)
        .args(["interactive", "--subprocess"])
        .env_remove("YOUTRACK_URL")
        .env_remove("YOUTRACK_TOKEN")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("failed to spawn interactive session");

    thread::sleep(Duration::from_millis(500));
    let kill = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .expect("failed to send SIGINT");
    assert!(kill.success());
    thread::sleep(Duration::from_millis(500));

    let output = child.wait_with_output().expect("failed to collect session output");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "session exited with {}", output.status);
    assert!(stdout.contains("Exiting interactive client..."), "unexpected stdout: {stdout}");
}

#[test]
fn invalid_subcommand_exits_with_error() {
    let output = run_tracktools(&["nonsense"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("unrecognized subcommand"));
}
