// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn defaults_match_the_documented_capacity_and_deadline() {
    let config = OrchestratorConfig::default();
    assert_eq!(config.event_bus_capacity, DEFAULT_CAPACITY);
    assert_eq!(config.session_stop_deadline, Duration::from_secs(5));
    assert!(config.scene_dir.is_none());
    assert!(config.ocr_url.is_none());
}

#[test]
fn parse_duration_secs_rejects_non_numeric_input() {
    assert!(parse_duration_secs("soon").is_err());
}

#[test]
fn parse_duration_secs_accepts_whole_seconds() {
    assert_eq!(parse_duration_secs("30").unwrap_or(Duration::ZERO), Duration::from_secs(30));
}
