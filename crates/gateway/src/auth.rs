// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer-token middleware for the command/health surface, adapted from the
//! teacher's constant-time comparison so token checks aren't a timing leak.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::Response;

use crate::error;
use crate::state::GatewayState;

fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }
    acc == 0
}

pub fn validate_bearer(headers: &HeaderMap, expected: Option<&str>) -> Result<(), ()> {
    let Some(expected) = expected else { return Ok(()) };
    let header = headers.get("authorization").and_then(|v| v.to_str().ok()).ok_or(())?;
    let token = header.strip_prefix("Bearer ").ok_or(())?;
    if constant_time_eq(token, expected) {
        Ok(())
    } else {
        Err(())
    }
}

pub fn validate_ws_query(query: &str, expected: Option<&str>) -> Result<(), ()> {
    let Some(expected) = expected else { return Ok(()) };
    for pair in query.split('&') {
        if let Some(value) = pair.strip_prefix("token=") {
            if constant_time_eq(value, expected) {
                return Ok(());
            }
        }
    }
    Err(())
}

/// Exempts `/healthz`; `/api/v1/events` checks its token via query param in
/// the WS handler instead of the `Authorization` header.
pub async fn auth_layer(
    state: State<Arc<GatewayState>>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let path = req.uri().path();
    if path == "/healthz" || path == "/api/v1/events" {
        return next.run(req).await;
    }
    if validate_bearer(req.headers(), state.auth_token.as_deref()).is_err() {
        return error::unauthorized();
    }
    next.run(req).await
}
