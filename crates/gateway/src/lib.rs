// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway library: the HTTP+WebSocket boundary wired around `legion_core`.
//! `legiond`'s `main.rs` only parses config, initializes tracing, and calls
//! [`run`].

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use legion_core::bus::EventBus;
use legion_core::coordinator::{Coordinator, CoordinatorDeps};
use legion_core::driver::null_driver_factory;
use legion_core::ocr::{HttpOcrClient, NullOcrClient, OcrClient};
use legion_core::registry::{load_scene_bundles, load_scripts, ScriptRegistry};
use legion_core::scene::SceneRegistry;
use legion_core::storage::InMemoryAccountRepository;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::GatewayConfig;
use crate::state::GatewayState;

/// Build the coordinator's dependencies, bind, and serve until shutdown.
pub async fn run(config: GatewayConfig) -> anyhow::Result<()> {
    let bus = EventBus::with_capacity(config.orchestrator.event_bus_capacity);
    let scenes = Arc::new(SceneRegistry::new());
    let scripts = Arc::new(ScriptRegistry::new());

    if let Some(dir) = &config.orchestrator.scene_dir {
        let count = load_scene_bundles(&scenes, dir).await?;
        info!(dir = %dir.display(), count, "loaded scene bundles");
    }
    if let Some(dir) = &config.orchestrator.script_dir {
        let count = load_scripts(&scripts, dir).await?;
        info!(dir = %dir.display(), count, "loaded scripts");
    }

    let ocr: Arc<dyn OcrClient> = match &config.orchestrator.ocr_url {
        Some(url) => HttpOcrClient::new(url.clone(), config.orchestrator.ocr_probe_interval),
        None => {
            warn!("no OCR service configured; OCR-gated quit conditions will always report unavailable");
            Arc::new(NullOcrClient)
        }
    };

    // No real browser-automation backend ships with this crate (spec
    // non-goal: "does not implement its own browser") — a production
    // deployment swaps `null_driver_factory` for its own `BrowserDriver`.
    let driver_factory = null_driver_factory();

    let coordinator = Coordinator::new(CoordinatorDeps {
        bus,
        scenes,
        scripts,
        accounts: Arc::new(InMemoryAccountRepository::new()),
        ocr: ocr.clone(),
        driver_factory,
    });

    let shutdown = CancellationToken::new();
    let state = Arc::new(GatewayState { coordinator: coordinator.clone(), ocr, auth_token: config.auth_token.clone() });
    let router = routes::build_router(state);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "legiond listening");

    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown signal received");
        shutdown_signal.cancel();
    });

    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    coordinator.shutdown().await;
    Ok(())
}
