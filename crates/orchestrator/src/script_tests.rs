// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use proptest::prelude::*;

use super::*;
use std::collections::HashMap;

fn step_with_loop(start: usize, end: usize, actions_len: usize) -> Step {
    Step {
        scene: "city".into(),
        timeout: Duration::from_secs(5),
        actions: (0..actions_len).map(|_| Action::CheckScene).collect(),
        continue_on_failure: false,
        loop_: Some(Loop { start_index: start, end_index: end, count: 1, until: None, interval: Duration::ZERO }),
        ocr_rule: None,
    }
}

#[test]
fn counter_roundtrip_incr_twice_decr_once() {
    let mut counters: HashMap<String, i64> = HashMap::new();
    for key in ["k", "k"] {
        *counters.entry(key.to_string()).or_insert(0) += 1;
    }
    *counters.entry("k".to_string()).or_insert(0) -= 1;
    assert_eq!(counters["k"], 1);
}

#[test]
fn quit_condition_gt_zero_fires_after_first_incr() {
    let mut counters: HashMap<String, i64> = HashMap::new();
    *counters.entry("k".to_string()).or_insert(0) += 1;
    let cond = Condition { op: CompareOp::Gt, counter_key: "k".into(), value: 0 };
    assert!(cond.evaluate(&counters));
}

#[test]
fn condition_treats_unknown_key_as_zero() {
    let counters: HashMap<String, i64> = HashMap::new();
    let cond = Condition { op: CompareOp::Eq, counter_key: "missing".into(), value: 0 };
    assert!(cond.evaluate(&counters));
}

#[test]
fn loop_indices_inside_bounds_validate() {
    let step = step_with_loop(0, 1, 2);
    assert!(step.validate(0).is_ok());
}

#[test]
fn loop_start_after_end_is_rejected() {
    let step = step_with_loop(2, 1, 3);
    let err = step.validate(0).unwrap_err();
    assert!(matches!(err, OrchestratorError::ValidationFailure { .. }));
}

#[test]
fn loop_end_index_out_of_bounds_is_rejected() {
    let step = step_with_loop(0, 5, 2);
    assert!(step.validate(0).is_err());
}

proptest! {
    // A loop's indices validate iff they lie inside the action list with
    // start <= end, regardless of how that list or the indices are chosen.
    #[test]
    fn loop_validate_matches_bounds_invariant(
        start in 0usize..12,
        end in 0usize..12,
        actions_len in 1usize..12,
    ) {
        let step = step_with_loop(start, end, actions_len);
        let expected_ok = start <= end && end < actions_len;
        prop_assert_eq!(step.validate(0).is_ok(), expected_ok);
    }
}

#[test]
fn script_deserializes_from_json() -> anyhow::Result<()> {
    let json = r#"{
        "name": "farm",
        "description": "collect resources",
        "version": "1",
        "author": "ops",
        "steps": [{
            "scene": "city",
            "timeout": "5s",
            "actions": [
                {"type": "incr", "counter_key": "k"},
                {"type": "click", "points": [{"x": 10, "y": 20}]}
            ],
            "continue_on_failure": false,
            "loop_": {"start_index": 0, "end_index": 1, "count": 3, "interval": "100ms"}
        }]
    }"#;
    let script: Script = serde_json::from_str(json)?;
    assert_eq!(script.steps[0].timeout, Duration::from_secs(5));
    assert_eq!(script.steps[0].loop_.as_ref().unwrap().count, 3);
    script.validate()?;
    Ok(())
}
