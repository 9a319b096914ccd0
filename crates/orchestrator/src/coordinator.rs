// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Coordinator: routes commands to sessions and fans global commands
//! out across all of them (spec §4.9).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::account::Account;
use crate::bus::EventBus;
use crate::command::{Command, SessionCommand};
use crate::driver::DriverFactory;
use crate::error::{EntityKind, OrchestratorError};
use crate::event::{Event, EventKind};
use crate::ocr::OcrClient;
use crate::registry::ScriptRegistry;
use crate::scene::SceneRegistry;
use crate::session::{spawn_session, SessionDeps, SessionHandle, STOP_DEADLINE};
use crate::state::SessionState;
use crate::storage::AccountRepository;

/// Shared ports every session spawned by a coordinator is handed a clone of.
pub struct CoordinatorDeps {
    pub bus: Arc<EventBus>,
    pub scenes: Arc<SceneRegistry>,
    pub scripts: Arc<ScriptRegistry>,
    pub accounts: Arc<dyn AccountRepository>,
    pub ocr: Arc<dyn OcrClient>,
    pub driver_factory: DriverFactory,
}

fn not_found(session_id: &str) -> OrchestratorError {
    OrchestratorError::NotFound { kind: EntityKind::Session, id: session_id.to_string() }
}

/// Owns the session map and is the single entry point for the command
/// surface (spec §4.9). Garbage-collects its own map entries on
/// `SessionStopped`, so callers never have to remember to clean up after a
/// session that stopped itself (a failed login, a crashed driver).
pub struct Coordinator {
    sessions: RwLock<HashMap<String, SessionHandle>>,
    deps: CoordinatorDeps,
    cancel: CancellationToken,
}

impl Coordinator {
    pub fn new(deps: CoordinatorDeps) -> Arc<Self> {
        let coordinator = Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            deps,
            cancel: CancellationToken::new(),
        });
        coordinator.clone().spawn_gc();
        coordinator
    }

    /// Subscribe to the bus once and drop a session's map entry whenever it
    /// reports `SessionStopped`, whatever the cause.
    fn spawn_gc(self: Arc<Self>) {
        tokio::spawn(async move {
            let bus = self.deps.bus.clone();
            let coordinator = self.clone();
            bus.subscribe(Arc::new(move |event: &Event| {
                if !matches!(event.kind, EventKind::SessionStopped { .. }) {
                    return;
                }
                let Some(session_id) = event.source_session_id().map(str::to_string) else {
                    return;
                };
                let coordinator = coordinator.clone();
                tokio::spawn(async move {
                    coordinator.sessions.write().await.remove(&session_id);
                });
            }))
            .await;
        });
    }

    /// Dispatch one command from the boundary (spec §6).
    pub async fn dispatch(&self, command: Command) -> Result<(), OrchestratorError> {
        match command {
            Command::StartSession { account_id, role_name, server_id, user_name, password, cookies } => {
                self.start_session(Account {
                    id: account_id,
                    role_name,
                    user_name,
                    password,
                    server_id,
                    ranking: 0,
                    cookies,
                })
                .await
            }
            Command::StopSession { session_id } => self.stop_session(&session_id).await,
            Command::StopAllSessions => {
                self.stop_all().await;
                Ok(())
            }
            Command::ClickAll { x, y } => {
                self.fan_out_if(SessionCommand::Click { x, y }, SessionState::accepts_fan_out_operations).await;
                Ok(())
            }
            Command::DragAll { points } => {
                self.fan_out_if(SessionCommand::Drag { points }, SessionState::accepts_fan_out_operations).await;
                Ok(())
            }
            Command::StartAllScripts { selections } => {
                self.start_all_scripts(selections).await;
                Ok(())
            }
            Command::StopAllScripts => {
                self.fan_out(SessionCommand::StopScript).await;
                Ok(())
            }
            Command::SyncScriptSelection { name } => {
                self.fan_out(SessionCommand::SetScriptSelection { name }).await;
                Ok(())
            }
            routed => {
                let session_id = routed.session_id().map(str::to_string);
                let session_cmd = routed.into_session_command();
                match (session_id, session_cmd) {
                    (Some(session_id), Some(cmd)) => self.route(&session_id, cmd).await,
                    _ => Err(not_found("")),
                }
            }
        }
    }

    async fn start_session(&self, account: Account) -> Result<(), OrchestratorError> {
        let driver = (self.deps.driver_factory)();
        let session_deps = SessionDeps {
            bus: self.deps.bus.clone(),
            scenes: self.deps.scenes.clone(),
            scripts: self.deps.scripts.clone(),
            accounts: self.deps.accounts.clone(),
            ocr: self.deps.ocr.clone(),
        };
        let id = account.id.clone();
        let handle = spawn_session(account, session_deps, driver, &self.cancel);
        self.sessions.write().await.insert(id, handle);
        Ok(())
    }

    async fn stop_session(&self, session_id: &str) -> Result<(), OrchestratorError> {
        let handle = self.sessions.write().await.remove(session_id);
        match handle {
            Some(handle) => {
                handle.stop().await;
                Ok(())
            }
            None => Err(not_found(session_id)),
        }
    }

    async fn stop_all(&self) {
        let handles: Vec<SessionHandle> = self.sessions.write().await.drain().map(|(_, h)| h).collect();
        let mut set = JoinSet::new();
        for handle in handles {
            set.spawn(async move { handle.stop().await });
        }
        while set.join_next().await.is_some() {}
    }

    async fn route(&self, session_id: &str, cmd: SessionCommand) -> Result<(), OrchestratorError> {
        let sessions = self.sessions.read().await;
        let handle = sessions.get(session_id).ok_or_else(|| not_found(session_id))?;
        handle.send(cmd)
    }

    /// Send `cmd` to every known session, regardless of state (spec §4.9:
    /// `SyncScriptSelection` reaches "every known session").
    async fn fan_out(&self, cmd: SessionCommand) {
        let sessions = self.sessions.read().await;
        for handle in sessions.values() {
            let _ = handle.send(cmd.clone());
        }
    }

    /// Send `cmd` only to sessions whose current state satisfies `filter`,
    /// so a fan-out never reaches a session that would just self-reject
    /// (spec §4.9: `ClickAll`/`DragAll` enumerate active-and-operational
    /// sessions; spec §8 S5 excludes `LoggingIn` specifically).
    async fn fan_out_if(&self, cmd: SessionCommand, filter: impl Fn(SessionState) -> bool) {
        let sessions = self.sessions.read().await;
        for handle in sessions.values() {
            if filter(handle.state().await) {
                let _ = handle.send(cmd.clone());
            }
        }
    }

    /// `StartAllScripts` (spec §4.9): enumerate `Ready` sessions and start
    /// each one's currently selected script, skipping empty selections. The
    /// command's `selections` map lets the caller set or override a
    /// session's pick in the same call; when a session isn't named in the
    /// map, its last `SetScriptSelection`/`SyncScriptSelection` choice
    /// (`SessionHandle::selected_script`) is used instead.
    async fn start_all_scripts(&self, selections: HashMap<String, String>) {
        let sessions = self.sessions.read().await;
        for (session_id, handle) in sessions.iter() {
            if handle.state().await != SessionState::Ready {
                continue;
            }
            let name = match selections.get(session_id) {
                Some(name) => Some(name.clone()),
                None => handle.selected_script().await,
            };
            if let Some(name) = name.filter(|name| !name.is_empty()) {
                let _ = handle.send(SessionCommand::StartScript { name });
            }
        }
    }

    pub async fn session_ids(&self) -> Vec<String> {
        self.sessions.read().await.keys().cloned().collect()
    }

    /// The bus this coordinator's sessions publish on, so a presentation
    /// layer can subscribe without threading its own copy through.
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.deps.bus
    }

    pub async fn session_state(&self, session_id: &str) -> Option<SessionState> {
        let sessions = self.sessions.read().await;
        match sessions.get(session_id) {
            Some(handle) => Some(handle.state().await),
            None => None,
        }
    }

    /// Stop every session, bounded by [`STOP_DEADLINE`], then close the bus.
    pub async fn shutdown(&self) {
        if tokio::time::timeout(STOP_DEADLINE, self.stop_all()).await.is_err() {
            warn!("coordinator shutdown exceeded its deadline; some sessions may still be draining");
        }
        self.deps.bus.close();
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
