// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire-format event types published on the [`crate::bus::EventBus`] (spec §3, §4.1).

use serde::{Deserialize, Serialize};

use crate::frame::Frame;
use crate::state::SessionState;

/// Why a script stopped running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Normal,
    Manual,
    Error,
    ResourceExhausted,
    BrowserStopped,
}

/// The payload of an [`Event`], tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    SessionStarted,
    SessionStopped {
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    SessionStateChanged {
        old: SessionState,
        new: SessionState,
    },
    DriverStarted,
    ScreencastStarted {
        quality: u8,
        max_fps: u32,
    },
    ScreencastStopped,
    ScreenCaptured {
        image: Frame,
    },
    LoginSucceeded,
    LoginFailed {
        error: String,
    },
    CookiesSaved,
    OperationFailed {
        op_name: String,
        error: String,
    },
    ScriptStarted {
        name: String,
    },
    ScriptStopped {
        name: String,
        reason: StopReason,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    ScriptStepExecuted {
        index: usize,
        scene_name: String,
    },
    ScriptSelectionChanged {
        name: String,
    },
}

/// An immutable value snapshot published on the bus.
///
/// `session_id` is `None` for bus-internal events with no single source
/// session; every kind defined today is session-scoped (spec §3), but the
/// bus contract allows for non-session events and filters them out of
/// session-scoped subscriptions (spec §4.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub session_id: Option<String>,
    pub seq: u64,
    pub kind: EventKind,
}

impl Event {
    pub fn session(session_id: impl Into<String>, seq: u64, kind: EventKind) -> Self {
        Self { session_id: Some(session_id.into()), seq, kind }
    }

    pub fn source_session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
