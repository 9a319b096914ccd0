// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP + WebSocket routes: a thin JSON boundary in front of `legion_core`.
//! No orchestration logic lives here — every handler either forwards a
//! command verbatim or relays bus events, the way the spec treats this
//! layer as a pure presentation surface.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use legion_core::command::Command;
use legion_core::event::Event;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::auth;
use crate::error;
use crate::state::GatewayState;

pub fn build_router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/v1/command", post(command))
        .route("/api/v1/events", get(events))
        .layer(middleware::from_fn_with_state(state.clone(), auth::auth_layer))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    session_count: usize,
    ocr_healthy: bool,
}

/// `GET /healthz` — liveness: the coordinator is reachable and the OCR
/// client's last liveness-probe result.
async fn healthz(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    let session_count = state.coordinator.session_ids().await.len();
    Json(HealthResponse { status: "running", session_count, ocr_healthy: state.ocr.is_healthy() })
}

/// `POST /api/v1/command` — forward a §6 command verbatim to the coordinator.
async fn command(State(state): State<Arc<GatewayState>>, Json(cmd): Json<Command>) -> impl IntoResponse {
    match state.coordinator.dispatch(cmd).await {
        Ok(()) => Json(serde_json::json!({ "ok": true })).into_response(),
        Err(e) => error::into_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct EventsQuery {
    token: Option<String>,
}

/// `GET /api/v1/events` — upgrade to a WebSocket and stream every bus event
/// as a newline-delimited JSON frame until the client disconnects.
async fn events(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<EventsQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let query_str = query.token.as_ref().map(|t| format!("token={t}")).unwrap_or_default();
    if auth::validate_ws_query(&query_str, state.auth_token.as_deref()).is_err() {
        return axum::http::Response::builder()
            .status(401)
            .body(axum::body::Body::from("unauthorized"))
            .unwrap_or_default()
            .into_response();
    }

    ws.on_upgrade(move |socket| stream_events(socket, state)).into_response()
}

async fn stream_events(mut socket: WebSocket, state: Arc<GatewayState>) {
    let (tx, mut rx) = tokio::sync::mpsc::channel(256);
    let sub_id = state
        .coordinator
        .bus()
        .subscribe(Arc::new(move |event: &Event| {
            let _ = tx.try_send(event.clone());
        }))
        .await;

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Some(event) => {
                        let line = match serde_json::to_string(&event) {
                            Ok(line) => line,
                            Err(_) => continue,
                        };
                        if socket.send(Message::Text(line.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    state.coordinator.bus().unsubscribe(sub_id).await;
}
