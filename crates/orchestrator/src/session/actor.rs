// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The session actor: a single serialized command loop owning one browser
//! driver end to end, from login through teardown (spec §4.5, §4.7).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::account::Account;
use crate::bus::EventBus;
use crate::command::SessionCommand;
use crate::driver::BrowserDriver;
use crate::error::OrchestratorError;
use crate::event::{Event, EventKind};
use crate::ocr::OcrClient;
use crate::registry::ScriptRegistry;
use crate::scene::SceneRegistry;
use crate::state::{check_transition, SessionState};
use crate::storage::AccountRepository;

use super::runner::{RunnerFinished, ScriptRunner};

/// Bound on how long [`SessionHandle::stop`] waits for the command loop to
/// drain before giving up on the join (spec §5).
pub const STOP_DEADLINE: Duration = Duration::from_secs(5);

/// Shared ports a session draws on besides its own account and driver.
pub struct SessionDeps {
    pub bus: Arc<EventBus>,
    pub scenes: Arc<SceneRegistry>,
    pub scripts: Arc<ScriptRegistry>,
    pub accounts: Arc<dyn AccountRepository>,
    pub ocr: Arc<dyn OcrClient>,
}

/// The slice of a session's identity needed to publish events and move its
/// state machine, shared by value with whichever task currently drives the
/// driver (the actor itself, or the bootstrap/script-runner it lends the
/// driver to).
#[derive(Clone)]
struct Ports {
    id: String,
    bus: Arc<EventBus>,
    state: Arc<RwLock<SessionState>>,
    seq: Arc<AtomicU64>,
}

impl Ports {
    fn publish(&self, kind: EventKind) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.bus.publish(Event::session(self.id.clone(), seq, kind));
    }

    async fn transition(&self, to: SessionState) -> Result<(), OrchestratorError> {
        let mut state = self.state.write().await;
        check_transition(*state, to)
            .map_err(|e| OrchestratorError::InvalidTransition { from: e.from, to: e.to })?;
        let old = *state;
        *state = to;
        drop(state);
        self.publish(EventKind::SessionStateChanged { old, new: to });
        Ok(())
    }
}

/// Handle to a spawned session: a command sender plus the state a caller
/// needs to read without round-tripping through the command loop.
pub struct SessionHandle {
    id: String,
    cmd_tx: mpsc::UnboundedSender<SessionCommand>,
    state: Arc<RwLock<SessionState>>,
    selected_script: Arc<RwLock<Option<String>>>,
    cancel: CancellationToken,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn state(&self) -> SessionState {
        *self.state.read().await
    }

    pub async fn selected_script(&self) -> Option<String> {
        self.selected_script.read().await.clone()
    }

    /// Enqueue a command for this session's loop. Fails only once the loop
    /// has already exited.
    pub fn send(&self, cmd: SessionCommand) -> Result<(), OrchestratorError> {
        self.cmd_tx.send(cmd).map_err(|_| OrchestratorError::Cancelled)
    }

    /// Cancel the actor and wait, bounded by [`STOP_DEADLINE`], for its
    /// command loop to finish tearing down the driver.
    pub async fn stop(&self) {
        self.cancel.cancel();
        let handle = self.join.lock().await.take();
        if let Some(handle) = handle {
            if tokio::time::timeout(STOP_DEADLINE, handle).await.is_err() {
                warn!(session_id = %self.id, "command loop did not exit within the stop deadline");
            }
        }
    }
}

/// Spawn a session actor for `account`, taking ownership of `driver`.
pub fn spawn_session(
    account: Account,
    deps: SessionDeps,
    driver: Box<dyn BrowserDriver>,
    parent_cancel: &CancellationToken,
) -> SessionHandle {
    let id = account.id.clone();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let state = Arc::new(RwLock::new(SessionState::Idle));
    let selected_script = Arc::new(RwLock::new(None));
    let cancel = parent_cancel.child_token();

    let ports = Ports { id: id.clone(), bus: deps.bus.clone(), state: state.clone(), seq: Arc::new(AtomicU64::new(0)) };

    let actor = Actor {
        ports,
        account,
        driver: Some(driver),
        deps,
        selected_script: selected_script.clone(),
        cancel: cancel.clone(),
        script_cancel: None,
        screencast_cancel: None,
        screencast_pump: None,
    };

    let join = tokio::spawn(actor.run(cmd_rx));

    SessionHandle { id, cmd_tx, state, selected_script, cancel, join: Mutex::new(Some(join)) }
}

fn login_url(account: &Account) -> String {
    format!("https://{}.example-game.test/login", account.server_id)
}

/// Drive a freshly spawned session from `Starting` through to `Ready`, or to
/// `Stopped` on failure (spec §4.7). Runs as its own task so the command loop
/// can keep accepting (and rejecting, per §3's state table) commands while
/// login is in flight — see S2 in spec §8.
///
/// Returns the driver (handed back regardless of outcome) and whether the
/// session reached `Ready`.
async fn bootstrap(ports: Ports, account: Account, mut driver: Box<dyn BrowserDriver>) -> (Box<dyn BrowserDriver>, bool) {
    if ports.transition(SessionState::Starting).await.is_err() {
        return (driver, false);
    }
    if let Err(e) = driver.start().await {
        fail(&ports, &mut *driver, e.to_string()).await;
        return (driver, false);
    }
    ports.publish(EventKind::DriverStarted);
    if ports.transition(SessionState::LoggingIn).await.is_err() {
        return (driver, false);
    }
    info!(session_id = %ports.id, "driver started, logging in");

    let login_result = match account.cookies.clone() {
        Some(cookies) if !cookies.is_empty() => {
            driver.login_with_cookies(login_url(&account), cookies, Duration::from_secs(30)).await
        }
        _ => {
            driver
                .login_with_password(
                    login_url(&account),
                    account.user_name.clone(),
                    account.password.clone(),
                    Duration::from_secs(30),
                )
                .await
        }
    };

    match login_result {
        Ok(()) => {
            ports.publish(EventKind::LoginSucceeded);
            let reached_ready = ports.transition(SessionState::Ready).await.is_ok();
            (driver, reached_ready)
        }
        Err(e) => {
            fail(&ports, &mut *driver, e.to_string()).await;
            (driver, false)
        }
    }
}

async fn fail(ports: &Ports, driver: &mut dyn BrowserDriver, error: String) {
    ports.publish(EventKind::LoginFailed { error: error.clone() });
    if ports.transition(SessionState::Stopping).await.is_ok() {
        let _ = driver.stop().await;
        let _ = ports.transition(SessionState::Stopped).await;
    }
    ports.publish(EventKind::SessionStopped { error: Some(error) });
}

struct Actor {
    ports: Ports,
    account: Account,
    /// `None` while the driver is on loan to the bootstrap task or a
    /// `ScriptRunner` (spec §4.5: one user at a time); driver-touching
    /// commands fail fast in that window.
    driver: Option<Box<dyn BrowserDriver>>,
    deps: SessionDeps,
    selected_script: Arc<RwLock<Option<String>>>,
    cancel: CancellationToken,
    script_cancel: Option<CancellationToken>,
    screencast_cancel: Option<CancellationToken>,
    screencast_pump: Option<JoinHandle<()>>,
}

impl Actor {
    fn publish(&self, kind: EventKind) {
        self.ports.publish(kind);
    }

    async fn transition(&self, to: SessionState) -> Result<(), OrchestratorError> {
        self.ports.transition(to).await
    }

    async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<SessionCommand>) {
        let Some(driver) = self.driver.take() else { return };
        let mut bootstrap_handle: Option<JoinHandle<(Box<dyn BrowserDriver>, bool)>> =
            Some(tokio::spawn(bootstrap(self.ports.clone(), self.account.clone(), driver)));
        let mut runner_handle: Option<JoinHandle<RunnerFinished>> = None;

        loop {
            let bootstrap_wait = async {
                match bootstrap_handle.as_mut() {
                    Some(handle) => handle.await,
                    None => std::future::pending().await,
                }
            };
            let runner_wait = async {
                match runner_handle.as_mut() {
                    Some(handle) => handle.await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                result = bootstrap_wait => {
                    bootstrap_handle = None;
                    if self.on_bootstrap_finished(result).await {
                        break;
                    }
                }
                result = runner_wait => {
                    runner_handle = None;
                    self.on_runner_finished(result).await;
                }
                maybe_cmd = cmd_rx.recv() => {
                    match maybe_cmd {
                        Some(cmd) => self.handle_command(cmd, &mut runner_handle).await,
                        None => break,
                    }
                }
            }
        }

        self.shutdown(runner_handle).await;
    }

    /// Returns `true` when the command loop should exit: the bootstrap task
    /// already drove the session to `Stopped`, or it never got the driver
    /// back because its task panicked.
    async fn on_bootstrap_finished(&mut self, result: Result<(Box<dyn BrowserDriver>, bool), JoinError>) -> bool {
        match result {
            Ok((driver, reached_ready)) => {
                self.driver = Some(driver);
                !reached_ready
            }
            Err(e) => {
                warn!(session_id = %self.ports.id, error = %e, "session bootstrap task failed");
                let _ = self.transition(SessionState::Stopped).await;
                self.publish(EventKind::SessionStopped { error: Some(e.to_string()) });
                true
            }
        }
    }

    async fn on_runner_finished(&mut self, result: Result<RunnerFinished, JoinError>) {
        self.script_cancel = None;
        match result {
            Ok(finished) => {
                self.driver = Some(finished.driver);
                let _ = self.transition(SessionState::Ready).await;
            }
            Err(e) => {
                warn!(session_id = %self.ports.id, error = %e, "script runner task failed");
                let _ = self.transition(SessionState::Stopping).await;
                if let Some(driver) = self.driver.as_mut() {
                    let _ = driver.stop().await;
                }
                let _ = self.transition(SessionState::Stopped).await;
                self.publish(EventKind::SessionStopped { error: Some(e.to_string()) });
            }
        }
    }

    async fn handle_command(
        &mut self,
        cmd: SessionCommand,
        runner_handle: &mut Option<JoinHandle<RunnerFinished>>,
    ) {
        let current = *self.ports.state.read().await;
        match cmd {
            SessionCommand::Click { x, y } => {
                self.with_driver_op("click", current, |d| d.click(x, y)).await
            }
            SessionCommand::Drag { points } => {
                self.with_driver_op("drag", current, |d| d.drag_path(points)).await
            }
            SessionCommand::CaptureScreen { save_to_file: _ } => self.capture_screen(current).await,
            SessionCommand::RefreshPage => self.with_driver_op("refresh_page", current, |d| d.reload()).await,
            SessionCommand::SaveCookies => self.save_cookies(current).await,
            SessionCommand::StartScreencast { quality, max_fps } => {
                self.start_screencast(current, quality, max_fps).await
            }
            SessionCommand::StopScreencast => self.stop_screencast(current).await,
            SessionCommand::StartScript { name } => self.start_script(current, name, runner_handle).await,
            SessionCommand::StopScript => self.stop_script(current),
            SessionCommand::SetScriptSelection { name } => {
                *self.selected_script.write().await = Some(name.clone());
                self.publish(EventKind::ScriptSelectionChanged { name });
            }
        }
    }

    /// Run a driver-touching, argument-erased operation, rejecting it up
    /// front when the session won't accept operations or the driver is on
    /// loan to a running script.
    async fn with_driver_op<F>(&mut self, op_name: &str, current: SessionState, f: F)
    where
        F: FnOnce(&mut Box<dyn BrowserDriver>) -> crate::driver::BoxFuture<'_, anyhow::Result<()>>,
    {
        if !current.accepts_operations() {
            self.reject(op_name, format!("not accepting operations in state {current}"));
            return;
        }
        match self.driver.as_mut() {
            Some(driver) => {
                if let Err(e) = f(driver).await {
                    self.reject(op_name, e.to_string());
                }
            }
            None => self.reject(op_name, "driver is on loan to a running script".into()),
        }
    }

    fn reject(&self, op_name: &str, error: String) {
        self.publish(EventKind::OperationFailed { op_name: op_name.to_string(), error });
    }

    async fn capture_screen(&mut self, current: SessionState) {
        if !current.accepts_operations() {
            self.reject("capture_screen", format!("not accepting operations in state {current}"));
            return;
        }
        match self.driver.as_mut() {
            Some(driver) => match driver.capture_screen().await {
                Ok(frame) => self.publish(EventKind::ScreenCaptured { image: frame }),
                Err(e) => self.reject("capture_screen", e.to_string()),
            },
            None => self.reject("capture_screen", "driver is on loan to a running script".into()),
        }
    }

    /// Best-effort cookie persistence: failures surface as `OperationFailed`
    /// without moving the session out of its current state (spec §4.7 open
    /// question: `SaveCookies` never blocks and never fails the session).
    async fn save_cookies(&mut self, current: SessionState) {
        if !current.accepts_operations() {
            return;
        }
        let Some(driver) = self.driver.as_mut() else {
            self.reject("save_cookies", "driver is on loan to a running script".into());
            return;
        };
        match driver.get_cookies().await {
            Ok(cookies) => match self.deps.accounts.update_cookies(&self.account.id, cookies).await {
                Ok(()) => self.publish(EventKind::CookiesSaved),
                Err(e) => self.reject("save_cookies", e.to_string()),
            },
            Err(e) => self.reject("save_cookies", e.to_string()),
        }
    }

    async fn start_screencast(&mut self, current: SessionState, quality: u8, max_fps: u32) {
        if !current.accepts_operations() {
            self.reject("start_screencast", format!("not accepting operations in state {current}"));
            return;
        }
        let Some(driver) = self.driver.as_mut() else {
            self.reject("start_screencast", "driver is on loan to a running script".into());
            return;
        };
        match driver.start_screencast(quality, max_fps).await {
            Ok(mut rx) => {
                self.publish(EventKind::ScreencastStarted { quality, max_fps });
                let bus = self.deps.bus.clone();
                let session_id = self.ports.id.clone();
                let seq = self.ports.seq.clone();
                let cancel = self.cancel.child_token();
                self.screencast_cancel = Some(cancel.clone());
                self.screencast_pump = Some(tokio::spawn(async move {
                    loop {
                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            frame = rx.recv() => match frame {
                                Some(frame) => {
                                    let n = seq.fetch_add(1, Ordering::Relaxed);
                                    bus.publish(Event::session(session_id.clone(), n, EventKind::ScreenCaptured { image: frame }));
                                }
                                None => break,
                            }
                        }
                    }
                }));
            }
            Err(e) => self.reject("start_screencast", e.to_string()),
        }
    }

    async fn stop_screencast(&mut self, current: SessionState) {
        if !current.accepts_operations() {
            return;
        }
        if let Some(cancel) = self.screencast_cancel.take() {
            cancel.cancel();
        }
        if let Some(handle) = self.screencast_pump.take() {
            let _ = handle.await;
        }
        if let Some(driver) = self.driver.as_mut() {
            let _ = driver.stop_screencast().await;
        }
        self.publish(EventKind::ScreencastStopped);
    }

    async fn start_script(
        &mut self,
        current: SessionState,
        name: String,
        runner_handle: &mut Option<JoinHandle<RunnerFinished>>,
    ) {
        if !current.can_start_script() {
            self.reject("start_script", format!("cannot start a script from state {current}"));
            return;
        }
        let Some(script) = self.deps.scripts.get(&name).await else {
            self.reject("start_script", format!("script not found: {name}"));
            return;
        };
        let Some(driver) = self.driver.take() else {
            self.reject("start_script", "driver is on loan to a running script".into());
            return;
        };
        if self.transition(SessionState::ScriptRunning).await.is_err() {
            self.driver = Some(driver);
            return;
        }

        self.publish(EventKind::ScriptStarted { name: name.clone() });
        let script_cancel = self.cancel.child_token();
        self.script_cancel = Some(script_cancel.clone());
        let runner = ScriptRunner::new(
            self.ports.id.clone(),
            script,
            driver,
            self.deps.scenes.clone(),
            self.deps.ocr.clone(),
            self.deps.bus.clone(),
            script_cancel,
        );
        *runner_handle = Some(tokio::spawn(runner.run()));
    }

    fn stop_script(&mut self, current: SessionState) {
        if current.can_stop_script() {
            if let Some(cancel) = self.script_cancel.take() {
                cancel.cancel();
            }
        }
    }

    async fn shutdown(&mut self, runner_handle: Option<JoinHandle<RunnerFinished>>) {
        if let Some(handle) = runner_handle {
            if let Ok(finished) = handle.await {
                self.driver = Some(finished.driver);
            }
        }
        if let Some(cancel) = self.screencast_cancel.take() {
            cancel.cancel();
        }
        if let Some(handle) = self.screencast_pump.take() {
            let _ = handle.await;
        }

        let current = *self.ports.state.read().await;
        if current == SessionState::Stopped {
            return;
        }
        let _ = self.transition(SessionState::Stopping).await;
        if let Some(driver) = self.driver.as_mut() {
            let _ = driver.stop().await;
        }
        let _ = self.transition(SessionState::Stopped).await;
        self.publish(EventKind::SessionStopped { error: None });
        info!(session_id = %self.ports.id, "session stopped");
    }
}

#[cfg(test)]
#[path = "actor_tests.rs"]
mod tests;
