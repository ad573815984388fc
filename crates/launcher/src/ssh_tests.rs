// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn location_combines_user_and_hostname() {
    let launcher = SSHLauncher::new(
        vec!["ssh".into()],
        vec![],
        "alice",
        "host1",
        "engine".into(),
        vec![],
    );
    assert_eq!(launcher.location(), "alice@host1");
}

#[test]
fn location_is_just_hostname_when_user_is_empty() {
    let launcher = SSHLauncher::new(
        vec!["ssh".into()],
        vec![],
        "",
        "host2",
        "engine".into(),
        vec![],
    );
    assert_eq!(launcher.location(), "host2");
}

#[test]
fn command_line_places_location_before_program() {
    let launcher = SSHLauncher::new(
        vec!["ssh".into()],
        vec!["-o".into(), "BatchMode=yes".into()],
        "bob",
        "h3",
        "engine".into(),
        vec!["--x".into()],
    );
    let (_, args) = launcher.inner.command();
    assert_eq!(
        args,
        vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "bob@h3".to_string(),
            "engine".to_string(),
            "--x".to_string(),
        ]
    );
}

#[tokio::test]
async fn signal_before_running_is_a_no_op() {
    let mut launcher = SSHLauncher::new(
        vec!["true".into()],
        vec![],
        "",
        "host",
        "ignored".into(),
        vec![],
    );
    launcher.signal(Signal::SIGTERM);
    assert_eq!(launcher.state(), LauncherState::Before);
}
