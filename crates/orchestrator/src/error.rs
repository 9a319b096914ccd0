// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed error taxonomy shared across the command surface and the event bus.
//!
//! Internal plumbing returns `anyhow::Result`; anything that crosses the
//! command-dispatch boundary (`Coordinator::dispatch`, `Session::send`) is
//! narrowed to [`OrchestratorError`] so callers can match on cause instead
//! of parsing a message string.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::state::SessionState;

/// The kind of operation that timed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutKind {
    SceneWait,
    Driver,
    Login,
}

impl fmt::Display for TimeoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SceneWait => "scene_wait",
            Self::Driver => "driver",
            Self::Login => "login",
        };
        f.write_str(s)
    }
}

/// A single entity kind a `NotFound` error can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Session,
    Script,
    Scene,
    Account,
    Group,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Session => "session",
            Self::Script => "script",
            Self::Scene => "scene",
            Self::Account => "account",
            Self::Group => "group",
        };
        f.write_str(s)
    }
}

/// Unified error taxonomy for the orchestration core (spec §7).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrchestratorError {
    /// A session tried an illegal state transition.
    InvalidTransition { from: SessionState, to: SessionState },
    /// A caller referenced an id that does not resolve.
    NotFound { kind: EntityKind, id: String },
    /// The browser driver failed; fatal during start/login, non-fatal otherwise.
    DriverFault { underlying: String },
    /// The OCR service reported itself unhealthy; treated as a no-op by callers.
    OcrUnavailable,
    /// OCR ran but found no recognizable ratio in the ROI; treated as "skip this check".
    OcrNoMatch,
    /// A wait exceeded its deadline.
    Timeout { kind: TimeoutKind },
    /// The operation was cancelled by a session or coordinator shutdown.
    Cancelled,
    /// A script or scene document failed structural validation.
    ValidationFailure { path: String, reason: String },
}

impl OrchestratorError {
    /// Stable wire-format code, independent of the `Display` message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::DriverFault { .. } => "DRIVER_FAULT",
            Self::OcrUnavailable => "OCR_UNAVAILABLE",
            Self::OcrNoMatch => "OCR_NO_MATCH",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Cancelled => "CANCELLED",
            Self::ValidationFailure { .. } => "VALIDATION_FAILURE",
        }
    }

    /// True for errors that are fatal to the actor that produced them
    /// (drives a session straight to `Stopping`/`Stopped` rather than
    /// surfacing as a non-fatal `OperationFailed`).
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DriverFault { .. } | Self::ValidationFailure { .. })
    }
}

impl fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTransition { from, to } => {
                write!(f, "invalid transition {from:?} -> {to:?}")
            }
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::DriverFault { underlying } => write!(f, "driver fault: {underlying}"),
            Self::OcrUnavailable => f.write_str("ocr service unavailable"),
            Self::OcrNoMatch => f.write_str("ocr found no ratio in roi"),
            Self::Timeout { kind } => write!(f, "timeout: {kind}"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::ValidationFailure { path, reason } => {
                write!(f, "validation failure at {path}: {reason}")
            }
        }
    }
}

impl std::error::Error for OrchestratorError {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
