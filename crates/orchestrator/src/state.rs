// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The session state machine: a pure, stateless transition table plus the
//! derived predicates sessions and the coordinator consult before acting.

use serde::{Deserialize, Serialize};

/// Finite state of a running session (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Starting,
    LoggingIn,
    Ready,
    ScriptRunning,
    Stopping,
    Stopped,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::LoggingIn => "logging_in",
            Self::Ready => "ready",
            Self::ScriptRunning => "script_running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        }
    }

    /// Legal successor states for this state (table in spec §3).
    pub fn valid_transitions(self) -> &'static [SessionState] {
        match self {
            Self::Idle => &[Self::Starting],
            Self::Starting => &[Self::LoggingIn, Self::Stopping, Self::Stopped],
            Self::LoggingIn => &[Self::Ready, Self::Stopping, Self::Stopped],
            Self::Ready => &[Self::ScriptRunning, Self::Stopping],
            Self::ScriptRunning => &[Self::Ready, Self::Stopping],
            Self::Stopping => &[Self::Stopped],
            Self::Stopped => &[],
        }
    }

    /// Whether `self -> to` is a legal transition.
    pub fn can_transition_to(self, to: SessionState) -> bool {
        self.valid_transitions().contains(&to)
    }

    /// Neither freshly created nor torn down.
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Idle | Self::Stopped)
    }

    /// Can accept session-addressed commands (click, drag, capture, ...).
    pub fn accepts_operations(self) -> bool {
        matches!(self, Self::LoggingIn | Self::Ready | Self::ScriptRunning)
    }

    /// Narrower than `accepts_operations`: whether a coordinator fan-out
    /// (`ClickAll`/`DragAll`) should bother addressing this session at all.
    /// Excludes `LoggingIn` — the driver is on loan to the bootstrap task
    /// during login, so the session would just self-reject (spec §8 S5).
    pub fn accepts_fan_out_operations(self) -> bool {
        matches!(self, Self::Ready | Self::ScriptRunning)
    }

    pub fn can_start_script(self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn can_stop_script(self) -> bool {
        matches!(self, Self::ScriptRunning)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured failure returned by a rejected transition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IllegalTransition {
    pub from: SessionState,
    pub to: SessionState,
}

impl std::fmt::Display for IllegalTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "illegal transition {} -> {}", self.from, self.to)
    }
}

impl std::error::Error for IllegalTransition {}

/// Attempt a transition, returning the structured failure on rejection.
/// Stateless: callers own the atomic compare-and-set under their own lock.
pub fn check_transition(
    from: SessionState,
    to: SessionState,
) -> Result<(), IllegalTransition> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(IllegalTransition { from, to })
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
