// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn global_commands_have_no_session_id() {
    assert_eq!(Command::StopAllSessions.session_id(), None);
    assert_eq!(Command::ClickAll { x: 1, y: 2 }.session_id(), None);
}

#[test]
fn routed_commands_expose_session_id() {
    let cmd = Command::Click { session_id: "s1".into(), x: 1, y: 2 };
    assert_eq!(cmd.session_id(), Some("s1"));
}

#[test]
fn routed_command_converts_to_session_command() {
    let cmd = Command::StopScript { session_id: "s1".into() };
    assert_eq!(cmd.into_session_command(), Some(SessionCommand::StopScript));
}

#[test]
fn global_command_has_no_session_command_equivalent() {
    assert_eq!(Command::StopAllSessions.into_session_command(), None);
}

#[test]
fn deserializes_tagged_json() {
    let json = r#"{"type":"start_session","account_id":"a","role_name":"r","server_id":"s","user_name":"u","password":"p"}"#;
    let cmd: Command = serde_json::from_str(json).unwrap_or(Command::StopAllSessions);
    assert!(matches!(cmd, Command::StartSession { .. }));
}
