// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn session_constructor_sets_source_id() {
    let event = Event::session("acc-1", 7, EventKind::SessionStarted);
    assert_eq!(event.source_session_id(), Some("acc-1"));
    assert_eq!(event.seq, 7);
}

#[test]
fn serializes_with_tagged_kind() {
    let event = Event::session(
        "acc-1",
        1,
        EventKind::ScriptStopped { name: "farm".into(), reason: StopReason::Manual, error: None },
    );
    let json = serde_json::to_value(&event).unwrap_or_default();
    assert_eq!(json["kind"]["type"], "script_stopped");
    assert_eq!(json["kind"]["reason"], "manual");
    assert!(json["kind"].get("error").is_none());
}

#[test]
fn round_trips_through_json() {
    let event = Event::session(
        "acc-2",
        2,
        EventKind::SessionStateChanged { old: SessionState::Idle, new: SessionState::Starting },
    );
    let json = serde_json::to_string(&event).unwrap_or_default();
    let back: Event = serde_json::from_str(&json).unwrap_or_else(|_| event.clone());
    assert_eq!(back, event);
}
