// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    milliseconds = { "500ms", Duration::from_millis(500) },
    seconds = { "2s", Duration::from_secs(2) },
    fractional_seconds = { "1.5s", Duration::from_millis(1500) },
    minutes_and_seconds = { "1m30s", Duration::from_secs(90) },
    hours = { "1h", Duration::from_secs(3600) },
)]
fn parses_valid_durations(input: &str, expected: Duration) {
    assert_eq!(parse(input).unwrap(), expected);
}

#[test]
fn rejects_bare_number() {
    assert!(parse("500").is_err());
}

#[test]
fn rejects_unknown_unit() {
    assert!(parse("5x").is_err());
}

#[test]
fn rejects_empty() {
    assert!(parse("").is_err());
}
