// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step interpreter driving a single script run (spec §4.8).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::bus::EventBus;
use crate::driver::BrowserDriver;
use crate::error::OrchestratorError;
use crate::event::{Event, EventKind, StopReason};
use crate::ocr::OcrClient;
use crate::scene::{SceneMatcher, SceneRegistry};
use crate::script::{Action, Script, Step};

/// Resolved stop reason and, for non-`Normal` reasons, a human-readable cause.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerOutcome {
    pub reason: StopReason,
    pub error: Option<String>,
}

/// The driver is the session's only copy; the runner borrows exclusive
/// ownership of it for the run and hands it back when done, whatever the
/// outcome (spec §4.5: one driver per session, used from one place at a time).
pub struct RunnerFinished {
    pub outcome: RunnerOutcome,
    pub driver: Box<dyn BrowserDriver>,
}

enum StepOutcome {
    Continue,
    Stop(RunnerOutcome),
}

/// Interval between scene-wait retries while the expected scene has not
/// yet appeared (spec §4.8: "on the order of 100-300ms").
const SCENE_POLL_INTERVAL: Duration = Duration::from_millis(150);

pub struct ScriptRunner {
    session_id: String,
    script: Script,
    driver: Box<dyn BrowserDriver>,
    scenes: Arc<SceneRegistry>,
    ocr: Arc<dyn OcrClient>,
    bus: Arc<EventBus>,
    cancel: CancellationToken,
    seq: AtomicU64,
    counters: HashMap<String, i64>,
}

impl ScriptRunner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session_id: String,
        script: Script,
        driver: Box<dyn BrowserDriver>,
        scenes: Arc<SceneRegistry>,
        ocr: Arc<dyn OcrClient>,
        bus: Arc<EventBus>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            session_id,
            script,
            driver,
            scenes,
            ocr,
            bus,
            cancel,
            seq: AtomicU64::new(0),
            counters: HashMap::new(),
        }
    }

    fn publish(&self, kind: EventKind) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.bus.publish(Event::session(self.session_id.clone(), seq, kind));
    }

    fn classify_driver_error(&self, err: anyhow::Error) -> RunnerOutcome {
        let reason = if self.driver.is_running() { StopReason::Error } else { StopReason::BrowserStopped };
        RunnerOutcome { reason, error: Some(err.to_string()) }
    }

    /// Run the script to completion, publishing exactly one `ScriptStopped`
    /// with the resolved reason before returning (spec §4.8).
    pub async fn run(mut self) -> RunnerFinished {
        let name = self.script.name.clone();

        if let Err(e) = self.script.validate() {
            let outcome = RunnerOutcome { reason: StopReason::Error, error: Some(e.to_string()) };
            self.publish(EventKind::ScriptStopped {
                name,
                reason: outcome.reason,
                error: outcome.error.clone(),
            });
            return RunnerFinished { outcome, driver: self.driver };
        }

        let steps = self.script.steps.clone();
        let mut outcome = RunnerOutcome { reason: StopReason::Normal, error: None };
        for (index, step) in steps.iter().enumerate() {
            if self.cancel.is_cancelled() {
                outcome = RunnerOutcome { reason: StopReason::Manual, error: None };
                break;
            }
            match self.run_step(index, step).await {
                StepOutcome::Continue => {}
                StepOutcome::Stop(stop) => {
                    outcome = stop;
                    break;
                }
            }
        }

        self.publish(EventKind::ScriptStopped { name, reason: outcome.reason, error: outcome.error.clone() });
        RunnerFinished { outcome, driver: self.driver }
    }

    async fn run_step(&mut self, index: usize, step: &Step) -> StepOutcome {
        let Some(scene) = self.scenes.get(&step.scene).await else {
            return StepOutcome::Stop(RunnerOutcome {
                reason: StopReason::Error,
                error: Some(format!("scene not found: {}", step.scene)),
            });
        };
        let matcher = SceneMatcher::default();
        let deadline = Instant::now() + step.timeout;

        loop {
            if self.cancel.is_cancelled() {
                return StepOutcome::Stop(RunnerOutcome { reason: StopReason::Manual, error: None });
            }
            let frame = match self.driver.capture_screen().await {
                Ok(frame) => frame,
                Err(e) => return StepOutcome::Stop(self.classify_driver_error(e)),
            };
            if matcher.is_match(&scene, &frame) {
                break;
            }
            if Instant::now() >= deadline {
                return if step.continue_on_failure {
                    StepOutcome::Continue
                } else {
                    StepOutcome::Stop(RunnerOutcome {
                        reason: StopReason::Error,
                        error: Some(format!("timed out waiting for scene {}", step.scene)),
                    })
                };
            }
            if tokio::time::timeout(SCENE_POLL_INTERVAL, self.cancel.cancelled()).await.is_ok() {
                return StepOutcome::Stop(RunnerOutcome { reason: StopReason::Manual, error: None });
            }
        }

        self.publish(EventKind::ScriptStepExecuted { index, scene_name: step.scene.clone() });

        if let Some(stop) = self.run_actions(step).await {
            return StepOutcome::Stop(stop);
        }

        if let Some(ref rule) = step.ocr_rule {
            let frame = match self.driver.capture_screen().await {
                Ok(frame) => frame,
                Err(e) => return StepOutcome::Stop(self.classify_driver_error(e)),
            };
            let cropped = frame.crop(rule.roi.x, rule.roi.y, rule.roi.w, rule.roi.h).unwrap_or(frame);
            match self.ocr.recognize_usage_ratio(&cropped, None).await {
                Ok(result) if result.numerator <= rule.threshold => {
                    return StepOutcome::Stop(RunnerOutcome { reason: StopReason::ResourceExhausted, error: None });
                }
                Ok(_) => {}
                // OCRUnavailable is a no-op (continue); OCRNoMatch means no ratio
                // was found, so this check is skipped for the step (spec §7).
                Err(OrchestratorError::OcrUnavailable) | Err(OrchestratorError::OcrNoMatch) => {}
                Err(e) => return StepOutcome::Stop(self.classify_driver_error(e.into())),
            }
        }

        StepOutcome::Continue
    }

    /// Runs `step.actions`, applying loop semantics when `step.loop_` is set.
    /// Returns `Some(outcome)` to stop the script, `None` to proceed.
    async fn run_actions(&mut self, step: &Step) -> Option<RunnerOutcome> {
        let actions = step.actions.clone();
        let Some(loop_spec) = step.loop_.clone() else {
            for action in &actions {
                if let Some(outcome) = self.run_action(action, step).await {
                    return Some(outcome);
                }
            }
            return None;
        };

        for action in &actions[..loop_spec.start_index] {
            if let Some(outcome) = self.run_action(action, step).await {
                return Some(outcome);
            }
        }

        let mut iteration: i64 = 0;
        loop {
            if self.cancel.is_cancelled() {
                return Some(RunnerOutcome { reason: StopReason::Manual, error: None });
            }
            if loop_spec.count >= 0 && iteration >= loop_spec.count {
                break;
            }
            if let Some(ref until_scene) = loop_spec.until {
                match self.driver.capture_screen().await {
                    Ok(frame) => {
                        if let Some(scene) = self.scenes.get(until_scene).await {
                            if SceneMatcher::default().is_match(&scene, &frame) {
                                break;
                            }
                        }
                    }
                    Err(e) => return Some(self.classify_driver_error(e)),
                }
            }

            for action in &actions[loop_spec.start_index..=loop_spec.end_index] {
                if let Some(outcome) = self.run_action(action, step).await {
                    return Some(outcome);
                }
            }

            iteration += 1;
            if !loop_spec.interval.is_zero()
                && tokio::time::timeout(loop_spec.interval, self.cancel.cancelled()).await.is_ok()
            {
                return Some(RunnerOutcome { reason: StopReason::Manual, error: None });
            }
        }

        for action in &actions[loop_spec.end_index + 1..] {
            if let Some(outcome) = self.run_action(action, step).await {
                return Some(outcome);
            }
        }
        None
    }

    async fn run_action(&mut self, action: &Action, step: &Step) -> Option<RunnerOutcome> {
        if self.cancel.is_cancelled() {
            return Some(RunnerOutcome { reason: StopReason::Manual, error: None });
        }
        match action {
            Action::Click { points, retry_count } => {
                for point in points {
                    let mut attempts = 0u32;
                    loop {
                        match self.driver.click(point.x, point.y).await {
                            Ok(()) => break,
                            Err(e) => {
                                if attempts >= *retry_count {
                                    if step.continue_on_failure {
                                        break;
                                    }
                                    return Some(self.classify_driver_error(e));
                                }
                                attempts += 1;
                            }
                        }
                    }
                }
                None
            }
            Action::Drag { points } => {
                if points.len() >= 2 {
                    if let Err(e) = self.driver.drag_path(points.clone()).await {
                        if !step.continue_on_failure {
                            return Some(self.classify_driver_error(e));
                        }
                    }
                }
                None
            }
            Action::Wait { duration } => {
                if tokio::time::timeout(*duration, self.cancel.cancelled()).await.is_ok() {
                    return Some(RunnerOutcome { reason: StopReason::Manual, error: None });
                }
                None
            }
            Action::Incr { counter_key } => {
                *self.counters.entry(counter_key.clone()).or_insert(0) += 1;
                None
            }
            Action::Decr { counter_key } => {
                *self.counters.entry(counter_key.clone()).or_insert(0) -= 1;
                None
            }
            Action::Quit { condition } => {
                if condition.evaluate(&self.counters) {
                    Some(RunnerOutcome { reason: StopReason::Normal, error: None })
                } else {
                    None
                }
            }
            Action::CheckScene => match self.driver.capture_screen().await {
                Ok(frame) => match self.scenes.get(&step.scene).await {
                    Some(scene) if SceneMatcher::default().is_match(&scene, &frame) => None,
                    _ if step.continue_on_failure => None,
                    _ => Some(RunnerOutcome {
                        reason: StopReason::Error,
                        error: Some(format!("check_scene mismatch for {}", step.scene)),
                    }),
                },
                Err(e) => Some(self.classify_driver_error(e)),
            },
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
