// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OCRClient port (spec §4.6): a ratio-recognition capability consumed by
//! the script runner's OCR-gated quit condition.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::OrchestratorError;
use crate::frame::Frame;
use crate::script::Roi;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result of a usage-ratio recognition call ("N/M" read from a ROI).
#[derive(Debug, Clone, PartialEq)]
pub struct OcrResult {
    pub numerator: i64,
    pub denominator: i64,
    pub raw_text: String,
    pub confidence: f64,
    pub elapsed_ms: u64,
}

/// Remote OCR recognizer, called over an unspecified transport (spec §4.6).
pub trait OcrClient: Send + Sync {
    fn recognize_usage_ratio(
        &self,
        frame: &Frame,
        roi: Option<Roi>,
    ) -> BoxFuture<'_, Result<OcrResult, OrchestratorError>>;

    /// Whether the last liveness probe considered the service healthy.
    fn is_healthy(&self) -> bool;
}

/// Crop to `roi` locally before handing the image to the client, to reduce
/// wire payload when the frame supports sub-image extraction (spec §4.6).
fn crop_for_roi(frame: &Frame, roi: Option<Roi>) -> Frame {
    match roi {
        Some(r) => frame.crop(r.x, r.y, r.w, r.h).unwrap_or_else(|| frame.clone()),
        None => frame.clone(),
    }
}

/// No-op OCR implementation for environments without a recognizer. Always
/// reports unhealthy and every call fails with `OcrUnavailable` (spec §4.6).
#[derive(Debug, Default)]
pub struct NullOcrClient;

impl OcrClient for NullOcrClient {
    fn recognize_usage_ratio(
        &self,
        _frame: &Frame,
        _roi: Option<Roi>,
    ) -> BoxFuture<'_, Result<OcrResult, OrchestratorError>> {
        Box::pin(async move { Err(OrchestratorError::OcrUnavailable) })
    }

    fn is_healthy(&self) -> bool {
        false
    }
}

/// HTTP-backed OCR client with a background liveness probe.
///
/// While the probe reports unhealthy, recognition calls fail fast with
/// `OcrUnavailable` instead of attempting the network round trip.
pub struct HttpOcrClient {
    http: reqwest::Client,
    base_url: String,
    healthy: Arc<AtomicBool>,
    probe_cancel: CancellationToken,
}

#[derive(serde::Serialize)]
struct RecognizeRequest<'a> {
    image_base64: &'a str,
}

#[derive(serde::Deserialize)]
struct RecognizeResponse {
    numerator: i64,
    denominator: i64,
    raw_text: String,
    confidence: f64,
}

impl HttpOcrClient {
    /// Construct a client and spawn its background liveness probe.
    pub fn new(base_url: impl Into<String>, probe_interval: Duration) -> Arc<Self> {
        let client = Arc::new(Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
            healthy: Arc::new(AtomicBool::new(false)),
            probe_cancel: CancellationToken::new(),
        });
        client.clone().spawn_liveness_probe(probe_interval);
        client
    }

    fn spawn_liveness_probe(self: Arc<Self>, interval: Duration) {
        let cancel = self.probe_cancel.clone();
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = timer.tick() => {}
                }
                let ok = self
                    .http
                    .get(format!("{}/healthz", self.base_url))
                    .send()
                    .await
                    .is_ok_and(|r| r.status().is_success());
                if !ok {
                    warn!(base_url = %self.base_url, "ocr liveness probe failed");
                }
                self.healthy.store(ok, Ordering::Release);
            }
        });
    }

    pub fn stop_probe(&self) {
        self.probe_cancel.cancel();
    }
}

impl OcrClient for HttpOcrClient {
    fn recognize_usage_ratio(
        &self,
        frame: &Frame,
        roi: Option<Roi>,
    ) -> BoxFuture<'_, Result<OcrResult, OrchestratorError>> {
        let cropped = crop_for_roi(frame, roi);
        Box::pin(async move {
            if !self.is_healthy() {
                return Err(OrchestratorError::OcrUnavailable);
            }
            let started = Instant::now();
            let body = RecognizeRequest { image_base64: &encode_rgba_len_marker(&cropped) };
            let resp = self
                .http
                .post(format!("{}/recognize", self.base_url))
                .json(&body)
                .send()
                .await
                .map_err(|e| OrchestratorError::DriverFault { underlying: e.to_string() })?;
            if !resp.status().is_success() {
                return Err(OrchestratorError::OcrUnavailable);
            }
            let parsed: RecognizeResponse = resp
                .json()
                .await
                .map_err(|e| OrchestratorError::DriverFault { underlying: e.to_string() })?;
            Ok(OcrResult {
                numerator: parsed.numerator,
                denominator: parsed.denominator,
                raw_text: parsed.raw_text,
                confidence: parsed.confidence,
                elapsed_ms: started.elapsed().as_millis() as u64,
            })
        })
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }
}

/// Placeholder wire encoding for the cropped frame. The real image codec is
/// an external concern (spec §1); this just proves the crop-then-send shape.
fn encode_rgba_len_marker(frame: &Frame) -> String {
    format!("{}x{}:{}", frame.width, frame.height, frame.rgba.len())
}

#[cfg(test)]
#[path = "ocr_tests.rs"]
mod tests;
