// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared axum state: the coordinator plus the bits the HTTP boundary needs
//! that the coordinator doesn't expose on its own (auth token, OCR liveness).

use std::sync::Arc;

use legion_core::coordinator::Coordinator;
use legion_core::ocr::OcrClient;

pub struct GatewayState {
    pub coordinator: Arc<Coordinator>,
    pub ocr: Arc<dyn OcrClient>,
    pub auth_token: Option<String>,
}
