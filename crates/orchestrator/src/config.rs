// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator-level runtime configuration, sourced from CLI flags or the
//! matching environment variable (spec §1, ambient).

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use crate::bus::DEFAULT_CAPACITY;

fn parse_duration_secs(s: &str) -> Result<Duration, std::num::ParseIntError> {
    s.parse::<u64>().map(Duration::from_secs)
}

/// Flags shared by every binary that wires up a [`crate::coordinator::Coordinator`].
#[derive(Debug, Clone, Args)]
pub struct OrchestratorConfig {
    /// Directory of `*.json` scene bundles loaded at startup.
    #[arg(long, env = "LEGION_SCENE_DIR")]
    pub scene_dir: Option<PathBuf>,

    /// Directory of `*.json` script documents loaded at startup.
    #[arg(long, env = "LEGION_SCRIPT_DIR")]
    pub script_dir: Option<PathBuf>,

    /// Base URL of the OCR recognition service; omit to run with no OCR
    /// support (every ROI check then reports `OcrUnavailable`).
    #[arg(long, env = "LEGION_OCR_URL")]
    pub ocr_url: Option<String>,

    /// How often the OCR client polls `/healthz` on its backing service.
    #[arg(long, env = "LEGION_OCR_PROBE_INTERVAL_SECS", default_value = "15", value_parser = parse_duration_secs)]
    pub ocr_probe_interval: Duration,

    /// Bounded-queue capacity of the event bus (spec §4.1).
    #[arg(long, env = "LEGION_EVENT_BUS_CAPACITY", default_value_t = DEFAULT_CAPACITY)]
    pub event_bus_capacity: usize,

    /// Bound on how long a session's command loop gets to drain on stop.
    #[arg(long, env = "LEGION_SESSION_STOP_DEADLINE_SECS", default_value = "5", value_parser = parse_duration_secs)]
    pub session_stop_deadline: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            scene_dir: None,
            script_dir: None,
            ocr_url: None,
            ocr_probe_interval: Duration::from_secs(15),
            event_bus_capacity: DEFAULT_CAPACITY,
            session_stop_deadline: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
