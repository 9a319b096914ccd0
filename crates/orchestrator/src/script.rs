// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Script/Step/Action/Condition/Loop/OcrRule data model (spec §3).

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::duration_fmt;
use crate::error::OrchestratorError;

/// A screen coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Comparison operator for [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// Evaluates against the session's counter map; unknown keys count as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub op: CompareOp,
    pub counter_key: String,
    pub value: i64,
}

impl Condition {
    pub fn evaluate(&self, counters: &HashMap<String, i64>) -> bool {
        let current = counters.get(&self.counter_key).copied().unwrap_or(0);
        match self.op {
            CompareOp::Eq => current == self.value,
            CompareOp::Neq => current != self.value,
            CompareOp::Gt => current > self.value,
            CompareOp::Gte => current >= self.value,
            CompareOp::Lt => current < self.value,
            CompareOp::Lte => current <= self.value,
        }
    }
}

/// One scripted action within a step's action list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Click {
        points: Vec<Point>,
        #[serde(default)]
        retry_count: u32,
    },
    Drag {
        points: Vec<Point>,
    },
    Wait {
        #[serde(with = "duration_fmt")]
        duration: Duration,
    },
    Incr {
        counter_key: String,
    },
    Decr {
        counter_key: String,
    },
    Quit {
        condition: Condition,
    },
    CheckScene,
}

/// Region of interest for an OCR rule, in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Roi {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Post-step OCR check: stop the script when the usage ratio's numerator
/// falls at or below `threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrRule {
    pub name: String,
    pub roi: Roi,
    pub threshold: i64,
}

/// `count = -1` means unbounded; `until`, when set, exits the loop early.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loop {
    pub start_index: usize,
    pub end_index: usize,
    pub count: i64,
    #[serde(default)]
    pub until: Option<String>,
    #[serde(with = "duration_fmt")]
    pub interval: Duration,
}

/// One unit of a script: wait for a scene, then run an action sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub scene: String,
    #[serde(with = "duration_fmt")]
    pub timeout: Duration,
    pub actions: Vec<Action>,
    #[serde(default)]
    pub continue_on_failure: bool,
    #[serde(default)]
    pub loop_: Option<Loop>,
    #[serde(default)]
    pub ocr_rule: Option<OcrRule>,
}

impl Step {
    /// Validate loop index invariants (spec §4.8, §4.4): indices lie inside
    /// the action list and `start <= end`. 0-based indices are canonical;
    /// see `DESIGN.md` for the Open Question this resolves.
    pub fn validate(&self, step_index: usize) -> Result<(), OrchestratorError> {
        if let Some(ref loop_) = self.loop_ {
            let path = format!("steps[{step_index}].loop");
            if loop_.start_index > loop_.end_index {
                return Err(OrchestratorError::ValidationFailure {
                    path,
                    reason: "start_index > end_index".into(),
                });
            }
            if loop_.end_index >= self.actions.len() {
                return Err(OrchestratorError::ValidationFailure {
                    path,
                    reason: "end_index out of bounds".into(),
                });
            }
        }
        Ok(())
    }
}

/// A named, versioned sequence of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub name: String,
    pub description: String,
    pub version: String,
    pub author: String,
    pub steps: Vec<Step>,
}

impl Script {
    /// Validate all steps; returns the first failure found.
    pub fn validate(&self) -> Result<(), OrchestratorError> {
        for (i, step) in self.steps.iter().enumerate() {
            step.validate(i)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;
