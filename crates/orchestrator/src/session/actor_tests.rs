// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::*;
use crate::bus::EventBus;
use crate::event::Event;
use crate::ocr::NullOcrClient;
use crate::registry::ScriptRegistry;
use crate::scene::{Checkpoint, Scene, SceneRegistry};
use crate::script::{Script, Step};
use crate::storage::InMemoryAccountRepository;
use crate::testkit::FakeBrowserDriver;

fn account(id: &str) -> Account {
    Account {
        id: id.into(),
        role_name: "scout".into(),
        user_name: "u".into(),
        password: "p".into(),
        server_id: "s1".into(),
        ranking: 0,
        cookies: None,
    }
}

fn deps(bus: Arc<EventBus>) -> SessionDeps {
    SessionDeps {
        bus,
        scenes: Arc::new(SceneRegistry::new()),
        scripts: Arc::new(ScriptRegistry::new()),
        accounts: Arc::new(InMemoryAccountRepository::new()),
        ocr: Arc::new(NullOcrClient),
    }
}

async fn wait_for_state(handle: &SessionHandle, target: SessionState) {
    for _ in 0..200 {
        if handle.state().await == target {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session did not reach {target} in time");
}

#[tokio::test]
async fn successful_login_reaches_ready() {
    let cancel = CancellationToken::new();
    let bus = EventBus::new();
    let handle = spawn_session(account("a1"), deps(bus), Box::new(FakeBrowserDriver::new()), &cancel);
    wait_for_state(&handle, SessionState::Ready).await;
    handle.stop().await;
}

#[tokio::test]
async fn failing_login_reaches_stopped_without_an_explicit_stop() {
    let cancel = CancellationToken::new();
    let bus = EventBus::new();
    let handle = spawn_session(
        account("a1"),
        deps(bus),
        Box::new(FakeBrowserDriver::new().with_fail_login()),
        &cancel,
    );
    wait_for_state(&handle, SessionState::Stopped).await;
}

#[tokio::test]
async fn stop_drives_a_ready_session_to_stopped() {
    let cancel = CancellationToken::new();
    let bus = EventBus::new();
    let handle = spawn_session(account("a1"), deps(bus), Box::new(FakeBrowserDriver::new()), &cancel);
    wait_for_state(&handle, SessionState::Ready).await;
    handle.stop().await;
    assert_eq!(handle.state().await, SessionState::Stopped);
}

#[tokio::test]
async fn start_script_while_still_logging_in_is_rejected() {
    let bus = EventBus::new();
    let captured: Arc<Mutex<Vec<EventKind>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = captured.clone();
    bus.subscribe(Arc::new(move |e: &Event| {
        sink.lock().unwrap_or_else(|e| e.into_inner()).push(e.kind.clone());
    }))
    .await;

    let cancel = CancellationToken::new();
    let driver = FakeBrowserDriver::new().with_login_delay(Duration::from_millis(100));
    let handle = spawn_session(account("a1"), deps(bus.clone()), Box::new(driver), &cancel);

    for _ in 0..50 {
        if handle.state().await == SessionState::LoggingIn {
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    assert_eq!(handle.state().await, SessionState::LoggingIn);

    handle.send(SessionCommand::StartScript { name: "s".into() }).unwrap_or(());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(handle.state().await, SessionState::LoggingIn);

    wait_for_state(&handle, SessionState::Ready).await;
    handle.stop().await;

    let events = captured.lock().unwrap_or_else(|e| e.into_inner());
    assert!(events
        .iter()
        .any(|k| matches!(k, EventKind::OperationFailed { op_name, .. } if op_name == "start_script")));
}

#[tokio::test]
async fn click_while_script_running_is_rejected_as_driver_busy() {
    let bus = EventBus::new();
    let captured: Arc<Mutex<Vec<EventKind>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = captured.clone();
    bus.subscribe(Arc::new(move |e: &Event| {
        sink.lock().unwrap_or_else(|e| e.into_inner()).push(e.kind.clone());
    }))
    .await;

    let scenes = Arc::new(SceneRegistry::new());
    scenes
        .register(Scene {
            name: "never".into(),
            category: "test".into(),
            points: vec![Checkpoint { x: 0, y: 0, r: 255, g: 255, b: 255, a: 255 }],
            actions: Default::default(),
        })
        .await;
    let scripts = Arc::new(ScriptRegistry::new());
    scripts
        .register(Script {
            name: "patrol".into(),
            description: String::new(),
            version: "1".into(),
            author: "a".into(),
            steps: vec![Step {
                scene: "never".into(),
                timeout: Duration::from_secs(5),
                actions: vec![],
                continue_on_failure: false,
                loop_: None,
                ocr_rule: None,
            }],
        })
        .await;

    let deps = SessionDeps {
        bus: bus.clone(),
        scenes,
        scripts,
        accounts: Arc::new(InMemoryAccountRepository::new()),
        ocr: Arc::new(NullOcrClient),
    };
    let cancel = CancellationToken::new();
    let handle = spawn_session(account("a1"), deps, Box::new(FakeBrowserDriver::new()), &cancel);
    wait_for_state(&handle, SessionState::Ready).await;

    handle.send(SessionCommand::StartScript { name: "patrol".into() }).unwrap_or(());
    wait_for_state(&handle, SessionState::ScriptRunning).await;

    handle.send(SessionCommand::Click { x: 1, y: 1 }).unwrap_or(());
    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.stop().await;

    let events = captured.lock().unwrap_or_else(|e| e.into_inner());
    assert!(events
        .iter()
        .any(|k| matches!(k, EventKind::OperationFailed { op_name, .. } if op_name == "click")));
}
