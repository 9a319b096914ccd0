// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The command surface the boundary issues (spec §6).

use serde::{Deserialize, Serialize};

use crate::account::Cookie;
use crate::script::Point;

/// A command addressed to a specific session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionCommand {
    Click { x: i32, y: i32 },
    Drag { points: Vec<Point> },
    CaptureScreen { save_to_file: Option<String> },
    RefreshPage,
    SaveCookies,
    StartScreencast { quality: u8, max_fps: u32 },
    StopScreencast,
    StartScript { name: String },
    StopScript,
    SetScriptSelection { name: String },
}

/// The full command surface: global (coordinator-handled) and routed
/// (delivered verbatim to a session).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    StartSession {
        account_id: String,
        role_name: String,
        server_id: String,
        user_name: String,
        password: String,
        #[serde(default)]
        cookies: Option<Vec<Cookie>>,
    },
    StopSession {
        session_id: String,
    },
    StopAllSessions,
    Click {
        session_id: String,
        x: i32,
        y: i32,
    },
    Drag {
        session_id: String,
        points: Vec<Point>,
    },
    ClickAll {
        x: i32,
        y: i32,
    },
    DragAll {
        points: Vec<Point>,
    },
    CaptureScreen {
        session_id: String,
        #[serde(default)]
        save_to_file: Option<String>,
    },
    RefreshPage {
        session_id: String,
    },
    SaveCookies {
        session_id: String,
    },
    StartScreencast {
        session_id: String,
        quality: u8,
        max_fps: u32,
    },
    StopScreencast {
        session_id: String,
    },
    StartScript {
        session_id: String,
        name: String,
    },
    StopScript {
        session_id: String,
    },
    StartAllScripts {
        selections: std::collections::HashMap<String, String>,
    },
    StopAllScripts,
    SetScriptSelection {
        session_id: String,
        name: String,
    },
    SyncScriptSelection {
        name: String,
    },
}

impl Command {
    /// The session this command targets, if any (global commands return `None`).
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::StopSession { session_id }
            | Self::Click { session_id, .. }
            | Self::Drag { session_id, .. }
            | Self::CaptureScreen { session_id, .. }
            | Self::RefreshPage { session_id }
            | Self::SaveCookies { session_id }
            | Self::StartScreencast { session_id, .. }
            | Self::StopScreencast { session_id }
            | Self::StartScript { session_id, .. }
            | Self::StopScript { session_id }
            | Self::SetScriptSelection { session_id, .. } => Some(session_id),
            Self::StartSession { .. }
            | Self::StopAllSessions
            | Self::ClickAll { .. }
            | Self::DragAll { .. }
            | Self::StartAllScripts { .. }
            | Self::StopAllScripts
            | Self::SyncScriptSelection { .. } => None,
        }
    }

    /// Convert a routed command into the per-session command it carries, if any.
    pub fn into_session_command(self) -> Option<SessionCommand> {
        match self {
            Self::Click { x, y, .. } => Some(SessionCommand::Click { x, y }),
            Self::Drag { points, .. } => Some(SessionCommand::Drag { points }),
            Self::CaptureScreen { save_to_file, .. } => {
                Some(SessionCommand::CaptureScreen { save_to_file })
            }
            Self::RefreshPage { .. } => Some(SessionCommand::RefreshPage),
            Self::SaveCookies { .. } => Some(SessionCommand::SaveCookies),
            Self::StartScreencast { quality, max_fps, .. } => {
                Some(SessionCommand::StartScreencast { quality, max_fps })
            }
            Self::StopScreencast { .. } => Some(SessionCommand::StopScreencast),
            Self::StartScript { name, .. } => Some(SessionCommand::StartScript { name }),
            Self::StopScript { .. } => Some(SessionCommand::StopScript),
            Self::SetScriptSelection { name, .. } => Some(SessionCommand::SetScriptSelection { name }),
            Self::StartSession { .. }
            | Self::StopSession { .. }
            | Self::StopAllSessions
            | Self::ClickAll { .. }
            | Self::DragAll { .. }
            | Self::StartAllScripts { .. }
            | Self::StopAllScripts
            | Self::SyncScriptSelection { .. } => None,
        }
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
