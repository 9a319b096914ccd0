// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::*;
use crate::ocr::NullOcrClient;
use crate::registry::ScriptRegistry;
use crate::testkit::{fake_driver_factory, FakeBrowserDriver};

fn start_session_command(id: &str) -> Command {
    Command::StartSession {
        account_id: id.into(),
        role_name: "scout".into(),
        server_id: "s1".into(),
        user_name: "u".into(),
        password: "p".into(),
        cookies: None,
    }
}

fn harness(driver_factory: DriverFactory) -> Arc<Coordinator> {
    Coordinator::new(CoordinatorDeps {
        bus: EventBus::new(),
        scenes: Arc::new(SceneRegistry::new()),
        scripts: Arc::new(ScriptRegistry::new()),
        accounts: Arc::new(crate::storage::InMemoryAccountRepository::new()),
        ocr: Arc::new(NullOcrClient),
        driver_factory,
    })
}

async fn wait_for_state(coordinator: &Coordinator, session_id: &str, target: SessionState) {
    for _ in 0..200 {
        if coordinator.session_state(session_id).await == Some(target) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session {session_id} did not reach {target} in time");
}

#[tokio::test]
async fn start_session_then_routed_command_reaches_it() {
    let coordinator = harness(fake_driver_factory());
    coordinator.dispatch(start_session_command("a1")).await.unwrap_or(());
    wait_for_state(&coordinator, "a1", SessionState::Ready).await;

    let result = coordinator.dispatch(Command::Click { session_id: "a1".into(), x: 1, y: 1 }).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn stop_session_removes_it_from_the_map() {
    let coordinator = harness(fake_driver_factory());
    coordinator.dispatch(start_session_command("a1")).await.unwrap_or(());
    wait_for_state(&coordinator, "a1", SessionState::Ready).await;

    coordinator.dispatch(Command::StopSession { session_id: "a1".into() }).await.unwrap_or(());
    assert!(coordinator.session_ids().await.is_empty());
}

#[tokio::test]
async fn dispatching_to_an_unknown_session_is_not_found() {
    let coordinator = harness(fake_driver_factory());
    let err = coordinator.dispatch(Command::Click { session_id: "ghost".into(), x: 0, y: 0 }).await.unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
}

#[tokio::test]
async fn click_all_fans_out_to_every_session() {
    let coordinator = harness(fake_driver_factory());
    coordinator.dispatch(start_session_command("a1")).await.unwrap_or(());
    coordinator.dispatch(start_session_command("a2")).await.unwrap_or(());
    wait_for_state(&coordinator, "a1", SessionState::Ready).await;
    wait_for_state(&coordinator, "a2", SessionState::Ready).await;

    coordinator.dispatch(Command::ClickAll { x: 5, y: 5 }).await.unwrap_or(());
    // Fan-out is fire-and-forget; just confirm both sessions are still routable.
    assert!(coordinator.dispatch(Command::Click { session_id: "a1".into(), x: 0, y: 0 }).await.is_ok());
    assert!(coordinator.dispatch(Command::Click { session_id: "a2".into(), x: 0, y: 0 }).await.is_ok());
}

#[tokio::test]
async fn a_session_that_fails_login_is_garbage_collected_on_its_own() {
    let factory: DriverFactory =
        Arc::new(|| Box::new(FakeBrowserDriver::new().with_fail_login()) as Box<dyn crate::driver::BrowserDriver>);
    let coordinator = harness(factory);
    coordinator.dispatch(start_session_command("a1")).await.unwrap_or(());

    for _ in 0..200 {
        if coordinator.session_ids().await.is_empty() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("failed session was never garbage-collected");
}
